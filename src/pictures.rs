// Pictures from the most recent result and the ways to show them.
// The index is rebuilt on every query; `:p N` addresses it 1-based.

use crate::api::WolframClient;
use crate::config::ViewerKind;
use crate::xml::Image;
use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::Url;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, Command};
use tempfile::TempDir;
use tracing::debug;

/// Ordered image references from the last result.
#[derive(Debug, Default, Clone)]
pub struct PictureIndex {
    images: Vec<Image>,
}

impl PictureIndex {
    pub fn clear(&mut self) {
        self.images.clear();
    }

    /// Append an image and return its 1-based number.
    pub fn push(&mut self, image: Image) -> usize {
        self.images.push(image);
        self.images.len()
    }

    /// Look up picture `number` (1-based). `0` is never valid.
    pub fn get(&self, number: usize) -> Option<&Image> {
        number.checked_sub(1).and_then(|i| self.images.get(i))
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Image> {
        self.images.iter()
    }
}

/// Something that can put a picture in front of the user.
pub trait PictureViewer {
    fn show(&mut self, image: &Image) -> Result<()>;
}

/// Build the viewer selected in the config.
pub fn viewer_for(kind: ViewerKind, client: WolframClient) -> Box<dyn PictureViewer> {
    match kind {
        ViewerKind::External => Box::new(ExternalViewer::new(client)),
        ViewerKind::Inline => Box::new(InlineViewer::new(client, std::io::stdout())),
    }
}

/// Downloads the picture into a private temp directory and opens it with
/// the platform's default application. The directory and any opener
/// processes still running are cleaned up when the viewer is dropped.
pub struct ExternalViewer {
    client: WolframClient,
    opener: fn(&Path) -> Command,
    dir: Option<TempDir>,
    children: Vec<Child>,
    shown: usize,
}

impl ExternalViewer {
    pub fn new(client: WolframClient) -> Self {
        Self::with_opener(client, opener)
    }

    /// Use `opener` to build the command that opens a saved picture.
    pub fn with_opener(client: WolframClient, opener: fn(&Path) -> Command) -> Self {
        ExternalViewer {
            client,
            opener,
            dir: None,
            children: Vec::new(),
            shown: 0,
        }
    }

    /// Directory the pictures are saved in, once one has been shown.
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_ref().map(TempDir::path)
    }

    fn temp_path(&mut self, src: &str) -> Result<PathBuf> {
        let dir = match self.dir.take() {
            Some(dir) => dir,
            None => tempfile::Builder::new()
                .prefix("wa-cli-")
                .tempdir()
                .context("Failed to create picture directory")?,
        };
        self.shown += 1;
        let path = dir
            .path()
            .join(format!("picture-{}.{}", self.shown, extension_for(src)));
        self.dir = Some(dir);
        Ok(path)
    }

    /// Forget openers that already exited so they don't linger as zombies.
    fn reap_finished(&mut self) {
        self.children
            .retain_mut(|child| !matches!(child.try_wait(), Ok(Some(_)) | Err(_)));
    }
}

impl PictureViewer for ExternalViewer {
    fn show(&mut self, image: &Image) -> Result<()> {
        self.reap_finished();

        let bytes = self.client.fetch_image(&image.src)?;
        let path = self.temp_path(&image.src)?;
        std::fs::write(&path, bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        debug!(path = %path.display(), "opening picture");
        let child = (self.opener)(&path)
            .spawn()
            .with_context(|| format!("Failed to open {}", path.display()))?;
        self.children.push(child);
        Ok(())
    }
}

impl Drop for ExternalViewer {
    fn drop(&mut self) {
        for child in &mut self.children {
            let _ = child.wait();
        }
    }
}

fn opener(path: &Path) -> Command {
    if cfg!(target_os = "macos") {
        let mut cmd = Command::new("open");
        cmd.arg(path);
        cmd
    } else if cfg!(windows) {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", "start", ""]).arg(path);
        cmd
    } else {
        let mut cmd = Command::new("xdg-open");
        cmd.arg(path);
        cmd
    }
}

/// Draws the picture straight into the terminal using the iTerm2 inline
/// image escape sequence (also understood by WezTerm and others).
pub struct InlineViewer<W: Write> {
    client: WolframClient,
    out: W,
}

impl<W: Write> InlineViewer<W> {
    pub fn new(client: WolframClient, out: W) -> Self {
        InlineViewer { client, out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> PictureViewer for InlineViewer<W> {
    fn show(&mut self, image: &Image) -> Result<()> {
        let bytes = self.client.fetch_image(&image.src)?;
        write!(
            self.out,
            "\x1b]1337;File=inline=1;size={}:{}\x07\n",
            bytes.len(),
            STANDARD.encode(&bytes)
        )?;
        self.out.flush()?;
        Ok(())
    }
}

/// File extension for a picture URL. Result images are usually served from
/// a script with the type in the query (`MSPStoreType=image/gif`).
fn extension_for(src: &str) -> String {
    let Ok(url) = Url::parse(src) else {
        return "gif".to_string();
    };

    let from_query = url
        .query_pairs()
        .find_map(|(_, v)| v.strip_prefix("image/").map(str::to_string));
    if let Some(ext) = from_query.filter(|e| !e.is_empty()) {
        return ext;
    }

    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .and_then(|last| last.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.len() <= 4)
        .unwrap_or_else(|| "gif".to_string())
}
