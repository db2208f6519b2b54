use tracing::debug;

/// The parts of the user interface the season loader drives.
pub trait SeasonUi {
    fn change_status_text(&self, text: &str);

    fn enable_input(&self, enabled: bool);

    fn display_error_message(&self, text: &str, caption: &str);
}

/// Terminal front end used by the CLI.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleUi;

impl SeasonUi for ConsoleUi {
    fn change_status_text(&self, text: &str) {
        if !text.is_empty() {
            println!("{text}");
        }
    }

    fn enable_input(&self, enabled: bool) {
        debug!(enabled, "Season input toggled");
    }

    fn display_error_message(&self, text: &str, caption: &str) {
        eprintln!("Error: {text}");
        eprintln!("  {caption}");
    }
}
