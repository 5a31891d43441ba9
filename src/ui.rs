// UI layer: the query session plus the two ways of driving it, a single
// query from the command line or an interactive read-eval-print loop.
// The session does the work; `repl` and `single_query` only do terminal I/O.

use crate::api::WolframClient;
use crate::command::{Command, HELP};
use crate::config::Config;
use crate::pictures::{viewer_for, PictureIndex, PictureViewer};
use crate::render::{format_result, with_web_url, Palette};
use crate::xml::parse_query_result;
use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::time::Duration;
use tracing::warn;

pub const PROMPT: &str = ">> ";

/// What the caller should do after evaluating a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Print(String),
    Quit,
    /// Nothing to print (blank line, or a picture was shown).
    Nothing,
}

/// Everything needed to answer queries: the HTTP client, title colors and
/// the pictures of the last result.
pub struct Session {
    client: WolframClient,
    palette: Palette,
    show_url: bool,
    pictures: PictureIndex,
    viewer: Box<dyn PictureViewer>,
}

impl Session {
    /// Build a session with the picture viewer selected in the config.
    pub fn new(config: &Config) -> Result<Self> {
        let client = WolframClient::new(config)?;
        let viewer = viewer_for(config.picture_viewer, client.clone());
        Ok(Self::with_viewer(config, client, viewer))
    }

    pub fn with_viewer(
        config: &Config,
        client: WolframClient,
        viewer: Box<dyn PictureViewer>,
    ) -> Self {
        Session {
            client,
            palette: Palette::new(&config.colors),
            show_url: config.show_url,
            pictures: PictureIndex::default(),
            viewer,
        }
    }

    pub fn pictures(&self) -> &PictureIndex {
        &self.pictures
    }

    /// Evaluate one line of input: a `:` command or a query.
    pub fn eval(&mut self, line: &str) -> Outcome {
        let line = line.trim();
        if line.is_empty() {
            return Outcome::Nothing;
        }

        match Command::parse(line) {
            None => Outcome::Print(self.output(line)),
            Some(Err(e)) => Outcome::Print(e.to_string()),
            Some(Ok(Command::Quit)) => Outcome::Quit,
            Some(Ok(Command::Help)) => Outcome::Print(HELP.to_string()),
            Some(Ok(Command::ShowPicture(n))) => self.show_picture(n),
            Some(Ok(Command::AllPictures)) => self.show_all_pictures(),
        }
    }

    /// Run a query and format the answer. Any failure becomes a one-line
    /// `Error: ...` message and leaves the picture index empty.
    pub fn output(&mut self, query: &str) -> String {
        let spinner = spinner("Querying WolframAlpha...");
        let body = self
            .client
            .query(query)
            .and_then(|xml| parse_query_result(&xml));
        spinner.finish_and_clear();

        match body {
            Ok(result) => {
                let text = format_result(
                    &result,
                    &self.palette,
                    self.client.fetch_pics(),
                    &mut self.pictures,
                );
                if self.show_url {
                    with_web_url(&text, query)
                } else {
                    text
                }
            }
            Err(e) => {
                warn!(error = %e, "query failed");
                self.pictures.clear();
                format!("Error: {e}")
            }
        }
    }

    fn show_picture(&mut self, number: usize) -> Outcome {
        let Some(image) = self.pictures.get(number) else {
            return Outcome::Print("Invalid picture.".to_string());
        };
        match self.viewer.show(image) {
            Ok(()) => Outcome::Nothing,
            Err(e) => Outcome::Print(format!("Could not show picture: {e:#}")),
        }
    }

    fn show_all_pictures(&mut self) -> Outcome {
        if self.pictures.is_empty() {
            return Outcome::Print("No pictures.".to_string());
        }
        let failures: Vec<String> = self
            .pictures
            .iter()
            .enumerate()
            .filter_map(|(i, image)| {
                self.viewer
                    .show(image)
                    .err()
                    .map(|e| format!("Could not show picture {}: {e:#}", i + 1))
            })
            .collect();
        if failures.is_empty() {
            Outcome::Nothing
        } else {
            Outcome::Print(failures.join("\n"))
        }
    }
}

/// `indicatif`'s spinner is drawn on stderr and hidden when it isn't a
/// terminal, so piped output stays clean.
fn spinner(message: &'static str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Answer one query and return.
pub fn single_query(mut session: Session, query: &str) -> Result<()> {
    match session.eval(query) {
        Outcome::Print(text) => println!("{text}"),
        Outcome::Quit | Outcome::Nothing => {}
    }
    Ok(())
}

/// Read a line, print the answer, repeat. Ends on `:q` or end of input
/// (Ctrl-D); Ctrl-C only abandons the current line.
pub fn repl(mut session: Session) -> Result<()> {
    let mut editor = DefaultEditor::new()?;

    loop {
        match editor.readline(PROMPT) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    // History is a convenience; a failure here shouldn't stop the loop.
                    let _ = editor.add_history_entry(line.as_str());
                }
                match session.eval(&line) {
                    Outcome::Print(text) => println!("{text}\n"),
                    Outcome::Quit => break,
                    Outcome::Nothing => {}
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("(Interrupted - type :q to exit)");
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}
