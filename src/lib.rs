/*!
# Streams

Streams organizes daily notes into multiple named *streams*, each a folder
in a vault holding one `YYYY-MM-DD.md` note per day. It tracks the date
being viewed, renders a calendar of which days have notes, and can keep a
stream's notes encrypted through an optional encryption collaborator.

## Architecture

- `events`: publish/subscribe bus with bounded history
- `state`: viewed date and selected stream
- `settings`: the persisted settings record and its stores
- `streams`: stream list management and the active stream
- `paths`: deterministic note paths
- `vault`: file access for notes
- `crypto`: the optional encryption collaborator
- `notes`: resolving, creating, opening and listing notes
- `calendar`: month grid and bar views with content indicators
- `commands`: commands and ribbon entries derived from settings
- `app`: the context object wiring all of the above
- `cli`, `config`, `editor`, `errors`: the command-line front end and
  ambient infrastructure

## Usage Example

```rust,no_run
use streams::app::StreamsContext;
use streams::editor::SystemEditor;
use streams::settings::Stream;
use streams::Config;

fn main() -> streams::AppResult<()> {
    let config = Config::load()?;
    config.validate()?;

    let today = chrono::Local::now().date_naive();
    let mut ctx = StreamsContext::from_config(&config, today)?;
    let id = ctx.streams.add_stream(Stream::new("Work", "Journal/Work"))?.id.clone();
    ctx.streams.set_active_stream(Some(&id))?;

    ctx.open_note(None, &SystemEditor::new(config.editor.clone()), true)?;
    Ok(())
}
```
*/

pub mod app;
pub mod calendar;
/// Command-line interface for parsing and handling user arguments
pub mod cli;
pub mod commands;
/// Configuration loading and management
pub mod config;
pub mod constants;
pub mod crypto;
pub mod editor;
/// Error types and utilities for error handling
pub mod errors;
pub mod events;
pub mod notes;
pub mod paths;
pub mod settings;
pub mod state;
pub mod streams;
pub mod vault;

// Re-export important types for convenience
pub use app::StreamsContext;
pub use cli::CliArgs;
pub use config::Config;
pub use errors::{AppError, AppResult};
pub use events::{EventBus, Topic};
pub use settings::{Settings, Stream};
