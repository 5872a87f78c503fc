use derive_more::Display;

/// Progress reported by the orchestrators between units of work.
///
/// The callback receiving these returns [`ControlFlow::Break`] to stop the
/// check before the next unit; the partial result is still returned.
///
/// [`ControlFlow::Break`]: std::ops::ControlFlow::Break
#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum Progress {
    /// A book-package repository has been checked.
    #[display("Checked {repo_name} ({done}/{total})")]
    RepoChecked { repo_name: String, done: usize, total: usize },
    /// A file of a repository sweep has been checked.
    #[display("Checked {filename} ({done}/{total})")]
    FileChecked { filename: String, done: usize, total: usize },
}
