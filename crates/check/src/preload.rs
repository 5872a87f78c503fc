use crate::Engine;
use crate::books::Testament;
use crate::engine::require;
use crate::error::Result;
use crate::options::CheckOptions;
use crate::repos::RepoCode;
use tracing::instrument;

fn prepend(codes: &mut Vec<RepoCode>, code: RepoCode) {
    codes.retain(|existing| *existing != code);
    codes.insert(0, code);
}

impl Engine {
    /// The repositories [`preload`](Self::preload) would download, in order.
    pub fn preload_codes(&self, book_ids: &[&str], extra_repo_codes: &[RepoCode], options: &CheckOptions) -> Vec<RepoCode> {
        let mut codes = extra_repo_codes.to_vec();
        if let [only] = book_ids
            && only.eq_ignore_ascii_case("OBS")
        {
            prepend(&mut codes, RepoCode::Obs);
        }
        if book_ids.len() > options.original_language_threshold {
            let testaments: Vec<Testament> = book_ids.iter().filter_map(|id| self.books.testament(id)).collect();
            if testaments.contains(&Testament::Old) {
                prepend(&mut codes, RepoCode::Uhb);
            }
            if testaments.contains(&Testament::New) {
                prepend(&mut codes, RepoCode::Ugnt);
            }
        }
        codes
    }

    /// Download the archives of every repository that checking `book_ids`
    /// will need, so the checks themselves read from the archive cache.
    ///
    /// Best effort: a repository that can't be fetched is logged and skipped.
    /// Returns `true` only if every archive was fetched.
    #[instrument(skip(self, options))]
    pub async fn preload(
        &self,
        owner: &str,
        language_code: &str,
        book_ids: &[&str],
        git_ref: &str,
        extra_repo_codes: &[RepoCode],
        options: &CheckOptions,
    ) -> Result<bool> {
        require("owner", owner)?;
        require("language_code", language_code)?;
        require("git_ref", git_ref)?;

        let codes = self.preload_codes(book_ids, extra_repo_codes, options);
        let mut failures = 0;
        for code in &codes {
            let repo_owner = options.owner_for(*code, owner);
            let repo_name = code.repo_name(language_code);
            let repo_ref = code.git_ref(git_ref);
            match self.retriever.fetch_archive(repo_owner, &repo_name, repo_ref).await {
                Ok(true) => tracing::debug!(owner = repo_owner, repo = %repo_name, git_ref = repo_ref, "Preloaded archive"),
                Ok(false) => {
                    failures += 1;
                    tracing::warn!(owner = repo_owner, repo = %repo_name, git_ref = repo_ref, "Could not preload archive");
                },
                Err(e) => {
                    failures += 1;
                    let reason = (*e).to_string();
                    tracing::warn!(owner = repo_owner, repo = %repo_name, reason = %reason, "Could not preload archive");
                },
            }
        }
        tracing::info!(repos = codes.len(), failures, "Preload finished");
        Ok(failures == 0)
    }
}
