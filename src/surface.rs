//! Boundary with the host: committing pending draws, exporting the raster,
//! and resolving remote image sources.
//!
//! All three report failure as an `Err` value; nothing here panics or
//! retries, and nothing can be cancelled once started.

use std::future::Future;
use std::path::PathBuf;

use futures_intrusive::channel::shared::oneshot_channel;
use futures_util::future::try_join_all;
use log::debug;

use crate::error::{PosterError, Result};

/// Completion handle the host invokes once a commit has been painted.
pub type CommitCallback = Box<dyn FnOnce(Result<()>) + Send>;

/// A surface whose queued commands only become visible after a commit.
pub trait DrawSurface {
    /// Flushes queued commands. `reserve` keeps the previous contents instead
    /// of clearing first. `done` must be called exactly once.
    fn draw(&mut self, reserve: bool, done: CommitCallback);
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExportOptions {
    pub dir: PathBuf,
    /// File name without extension; the canvas id when unset.
    pub file_stem: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExportedImage {
    pub path: PathBuf,
}

/// A surface that can write its committed raster to a file.
pub trait RasterExport: DrawSurface {
    fn to_file(
        &mut self,
        canvas_id: &str,
        options: &ExportOptions,
    ) -> impl Future<Output = Result<PathBuf>>;
}

/// Fetches a remote image and caches it locally.
pub trait ImageFetcher {
    /// Resolves `src` to a local identifier the surface can load.
    fn fetch(&self, src: &str) -> impl Future<Output = Result<String>>;
}

/// Commits queued draws and waits for the host to confirm. The `&mut`
/// borrow keeps a second commit from starting before this one resolves.
pub async fn commit<S: DrawSurface + ?Sized>(surface: &mut S, reserve: bool) -> Result<()> {
    let (sender, receiver) = oneshot_channel();
    surface.draw(
        reserve,
        Box::new(move |result| {
            // A closed receiver means nobody is waiting any more.
            let _ = sender.send(result);
        }),
    );
    match receiver.receive().await {
        Some(result) => result,
        None => Err(PosterError::CommitDropped),
    }
}

/// Commits, then writes the raster out.
pub async fn export_raster<S: RasterExport + ?Sized>(
    surface: &mut S,
    canvas_id: &str,
    options: &ExportOptions,
) -> Result<ExportedImage> {
    commit(surface, false).await?;
    let path = surface.to_file(canvas_id, options).await?;
    debug!("exported canvas `{canvas_id}` to {}", path.display());
    Ok(ExportedImage { path })
}

pub fn is_remote(src: &str) -> bool {
    src.starts_with("http:") || src.starts_with("https:")
}

/// Resolves every source concurrently. Remote sources are replaced by their
/// fetched local identifier, local ones pass through, empty ones stay empty.
/// The output lines up with the input by index; any failure fails the batch.
pub async fn load_images<F, S>(fetcher: &F, sources: &[S]) -> Result<Vec<String>>
where
    F: ImageFetcher + ?Sized,
    S: AsRef<str>,
{
    let jobs = sources.iter().map(|src| async move {
        let src = src.as_ref();
        if is_remote(src) {
            fetcher.fetch(src).await
        } else {
            Ok(src.to_string())
        }
    });
    let resolved = try_join_all(jobs).await?;
    debug!("resolved {} image sources", resolved.len());
    Ok(resolved)
}
