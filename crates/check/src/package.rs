//! Book packages: one book checked across every companion repository.

use crate::Engine;
use crate::books::Testament;
use crate::checker::CheckContext;
use crate::engine::{merge, require};
use crate::error::{ErrorKind, Result};
use crate::options::CheckOptions;
use crate::progress::Progress;
use crate::repos::RepoCode;
use exn::ResultExt;
use serde::Deserialize;
use std::collections::HashSet;
use std::ops::ControlFlow;
use tcv_notice::{Notice, RawCheckResult};
use time::UtcDateTime;
use tracing::instrument;

/// The part of a resource container manifest naming each book's file.
#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default)]
    projects: Vec<Project>,
}

#[derive(Debug, Deserialize)]
struct Project {
    identifier: String,
    path: String,
}

/// A per-repository file checked once per book package.
struct RepoFile {
    filename: &'static str,
    label: &'static str,
    empty_message: &'static str,
}

const MANIFEST: RepoFile = RepoFile { filename: "manifest.yaml", label: "manifest", empty_message: "Got empty manifest file" };
const README: RepoFile = RepoFile { filename: "README.md", label: "README", empty_message: "Got empty markdown file" };
const LICENSE: RepoFile = RepoFile { filename: "LICENSE.md", label: "LICENSE", empty_message: "Got empty markdown file" };

/// `"007"` is `"7"`, `"00"` is `"0"`.
fn strip_leading_zeros(part: &str) -> &str {
    let stripped = part.trim_start_matches('0');
    if stripped.is_empty() && !part.is_empty() { "0" } else { stripped }
}

/// Chapter and verse of a legacy question file such as `tit/01/02.md`.
fn markdown_reference(path: &str) -> Option<(&str, &str)> {
    let path = path.strip_suffix(".md").unwrap_or(path);
    let parts: Vec<&str> = path.split('/').collect();
    match parts.as_slice() {
        [_, .., c, v] => Some((strip_leading_zeros(c), strip_leading_zeros(v))),
        _ => None,
    }
}

impl Engine {
    /// Check one book across every repository of its book package.
    ///
    /// A repository that can't be read produces a notice and the check moves
    /// on to the next one. `progress` is told about each repository as it
    /// completes and can stop the check early.
    ///
    /// `OBS` checks the whole stories repository instead.
    #[instrument(skip(self, progress, options))]
    pub async fn check_book_package<F>(
        &self,
        owner: &str,
        language_code: &str,
        book_id: &str,
        mut progress: F,
        options: &CheckOptions,
    ) -> Result<RawCheckResult>
    where
        F: FnMut(Progress) -> ControlFlow<()>,
    {
        require("owner", owner)?;
        require("language_code", language_code)?;
        require("book_id", book_id)?;
        let started = UtcDateTime::now();

        if book_id.eq_ignore_ascii_case("OBS") {
            let repo_name = RepoCode::Obs.repo_name(language_code);
            let mut result = self.check_repo(owner, &repo_name, &options.default_ref, progress, options).await?;
            result.add_success(format!("Checked {language_code} OBS repo from {owner}"));
            return Ok(result);
        }

        if !self.books.is_valid(book_id) {
            tracing::warn!(book_id, "Invalid book abbreviation");
            return Ok(RawCheckResult::single(
                Notice::new(902, "Bad function call: should be given a valid book abbreviation").with_excerpt(book_id),
            ));
        }
        let book_id = book_id.to_uppercase();
        let testament = self.books.testament(&book_id).unwrap_or(Testament::Other);
        let codes = options.dataset.repo_codes(testament);

        // Very long books produce too many notices for a location to help.
        let general_location = match self.books.chapter_count(&book_id) {
            Some(chapters) if chapters <= 10 => {
                format!(" in {language_code} {book_id} book package from {owner} {} branch", options.default_ref)
            },
            _ => String::new(),
        };

        let mut result = RawCheckResult::new();
        let mut checked_repos = HashSet::new();
        let total = codes.len();
        for (index, code) in codes.into_iter().enumerate() {
            let repo_name = code.repo_name(language_code);
            let context = CheckContext::new(
                options.owner_for(code, owner),
                language_code,
                &repo_name,
                code.git_ref(&options.default_ref),
            )
            .with_repo_code(code)
            .with_book_id(&book_id);
            let location = format!(" in {code}{general_location}");
            tracing::debug!(repo = %repo_name, code = %code, "Checking book package repository");

            if code == RepoCode::Tq {
                self.check_markdown_book(&context, &location, options, &mut result).await?;
            } else {
                let filename = self.book_filename(&context, code, &book_id).await?;
                self.check_book_file(&context, &filename, &location, options, &mut result).await?;
            }

            let repo_key = (context.owner.clone(), repo_name.clone(), context.git_ref.clone());
            if !options.disable_all_link_fetching && checked_repos.insert(repo_key) {
                self.check_repo_files(&context, &location, options, &mut result).await?;
            }

            if progress(Progress::RepoChecked { repo_name, done: index + 1, total }).is_break() {
                tracing::info!(book_id = %book_id, checked = index + 1, total, "Book package check cancelled");
                break;
            }
        }

        result.accounting.elapsed_seconds = (UtcDateTime::now() - started).as_seconds_f64();
        tracing::info!(
            book_id = %book_id,
            notices = result.notice_list.len(),
            elapsed = result.accounting.elapsed_seconds,
            "Checked book package"
        );
        Ok(result)
    }

    /// Name of the file holding `book_id` in `code`'s repository.
    async fn book_filename(&self, context: &CheckContext, code: RepoCode, book_id: &str) -> Result<String> {
        let numbered = self
            .books
            .numbered_filename(book_id)
            .ok_or_else(|| exn::Exn::from(ErrorKind::InvalidArgument(format!("no numbered filename for {book_id}"))))?;
        Ok(match code {
            RepoCode::Tn => self.legacy_notes_filename(context, book_id, &numbered).await?,
            RepoCode::Twl | RepoCode::Sn | RepoCode::Sq | RepoCode::Tn2 | RepoCode::Tq2 => {
                format!("{}_{book_id}.tsv", code.base().to_string().to_lowercase())
            },
            _ => format!("{numbered}.usfm"),
        })
    }

    /// Legacy notes name their book files in the manifest. Falls back to the
    /// conventional name if the manifest is missing or doesn't list the book.
    async fn legacy_notes_filename(&self, context: &CheckContext, book_id: &str, numbered: &str) -> Result<String> {
        let fallback = format!("{}_tn_{numbered}.tsv", context.language_code);
        let manifest = self
            .retriever
            .get_file(&context.owner, &context.repo_name, MANIFEST.filename, &context.git_ref)
            .await
            .or_raise(|| ErrorKind::Retrieval)?;
        let Some(manifest) = manifest else {
            return Ok(fallback);
        };
        match serde_yaml::from_str::<Manifest>(&manifest) {
            Ok(manifest) => Ok(manifest
                .projects
                .into_iter()
                .find(|project| project.identifier.eq_ignore_ascii_case(book_id))
                .map(|project| project.path.strip_prefix("./").map(str::to_string).unwrap_or(project.path))
                .unwrap_or(fallback)),
            Err(e) => {
                tracing::warn!(repo = %context.repo_name, error = %e, "Unreadable manifest");
                Ok(fallback)
            },
        }
    }

    async fn check_book_file(
        &self,
        context: &CheckContext,
        filename: &str,
        location: &str,
        options: &CheckOptions,
        result: &mut RawCheckResult,
    ) -> Result<()> {
        let code = context.repo_code.map(|code| code.to_string()).unwrap_or_default();
        let content = self
            .retriever
            .get_file(&context.owner, &context.repo_name, filename, &context.git_ref)
            .await
            .or_raise(|| ErrorKind::Retrieval)?;
        let Some(content) = content else {
            let priority = context.repo_code.map_or(996, RepoCode::load_failure_priority);
            let mut notice = self.load_failure(context, priority, "Unable to load book package file", filename, None).await?;
            notice.location = Some(location.to_string());
            notice.extra = Some(code);
            result.add_notice(notice);
            return Ok(());
        };
        let checked = self.checkers.check_file(context, filename, &content, location, options).await?;
        result.accounting.record_file(&context.repo_name, filename, content.len());
        merge(result, checked, context, filename, &code);
        result.add_success(format!("Checked {code} file: {filename}"));
        Ok(())
    }

    /// Legacy questions: one markdown file per verse under `{book}/`.
    async fn check_markdown_book(
        &self,
        context: &CheckContext,
        location: &str,
        options: &CheckOptions,
        result: &mut RawCheckResult,
    ) -> Result<()> {
        let code = context.repo_code.map(|code| code.to_string()).unwrap_or_default();
        let book_id = context.book_id.clone().unwrap_or_default();
        let prefix = format!("{}/", book_id.to_lowercase());
        let paths: Vec<String> = self
            .retriever
            .get_file_list(&context.owner, &context.repo_name, &context.git_ref, Some(&prefix))
            .await
            .or_raise(|| ErrorKind::Retrieval)?
            .unwrap_or_default()
            .into_iter()
            .filter(|path| path.ends_with(".md"))
            .collect();

        if paths.is_empty() {
            let details = Some(format!("folder={prefix}"));
            let mut notice = self.load_failure(context, 996, "Unable to load book package file", &prefix, details).await?;
            notice.filename = None;
            notice.location = Some(location.to_string());
            notice.extra = Some(code);
            result.add_notice(notice);
            return Ok(());
        }

        let mut checked_count = 0;
        for path in &paths {
            let file_context = match markdown_reference(path) {
                Some((c, v)) => context.clone().with_reference(c, v),
                None => context.clone(),
            };
            let content = self
                .retriever
                .get_file(&context.owner, &context.repo_name, path, &context.git_ref)
                .await
                .or_raise(|| ErrorKind::Retrieval)?;
            let Some(content) = content else {
                let mut notice = self.load_failure(&file_context, 996, "Failed to load", path, None).await?;
                notice.location = Some(location.to_string());
                notice.extra = Some(code.clone());
                result.add_notice(notice);
                continue;
            };
            let checked = self.checkers.check_file(&file_context, path, &content, location, options).await?;
            result.accounting.record_file(&context.repo_name, path, content.len());
            merge(result, checked, &file_context, path, &code);
            checked_count += 1;
        }
        result.add_success(format!("Checked {checked_count} TQ files: {book_id}"));
        Ok(())
    }

    /// Manifest, README and LICENSE of the repository, each when enabled.
    async fn check_repo_files(
        &self,
        context: &CheckContext,
        location: &str,
        options: &CheckOptions,
        result: &mut RawCheckResult,
    ) -> Result<()> {
        let code = context.repo_code.map(|code| code.to_string()).unwrap_or_default();
        let mut context = context.clone();
        context.book_id = None;
        let wanted = [
            (options.check_manifest, MANIFEST),
            (options.check_readme, README),
            (options.check_license, LICENSE),
        ];
        for (enabled, file) in wanted {
            if !enabled {
                continue;
            }
            let extra = format!("{code} {}", file.label.to_uppercase());
            let content = self
                .retriever
                .get_file(&context.owner, &context.repo_name, file.filename, &context.git_ref)
                .await
                .or_raise(|| ErrorKind::Retrieval)?;
            let Some(content) = content else {
                let message = format!("Unable to load {} file", file.label);
                let mut notice = self.load_failure(&context, 996, &message, file.filename, None).await?;
                notice.location = Some(location.to_string());
                notice.extra = Some(extra);
                result.add_notice(notice);
                continue;
            };
            if content.trim().is_empty() {
                let mut notice = Notice::new(956, file.empty_message)
                    .with_repo_name(&context.repo_name)
                    .with_filename(file.filename)
                    .with_location(location)
                    .with_extra(extra);
                notice.repo_code = context.repo_code.map(|code| code.to_string());
                notice.owner = Some(context.owner.clone());
                notice.git_ref = Some(context.git_ref.clone());
                result.add_notice(notice);
                continue;
            }

            let checked = self.checkers.check_file(&context, file.filename, &content, location, options).await?;
            result.accounting.record_file(&context.repo_name, file.filename, content.len());
            merge(result, checked, &context, file.filename, &extra);
            if file.filename == LICENSE.filename
                && let Some(notice) = copyright_year_notice(&content, UtcDateTime::now().year())
            {
                let mut notice = notice.with_repo_name(&context.repo_name).with_location(location).with_extra(extra);
                notice.repo_code = context.repo_code.map(|code| code.to_string());
                notice.owner = Some(context.owner.clone());
                notice.git_ref = Some(context.git_ref.clone());
                result.add_notice(notice);
            }
            result.add_success(format!("Checked {} {} file", context.repo_name, file.label));
        }
        Ok(())
    }
}

/// A licence updated last year is still current enough.
fn copyright_year_notice(license: &str, year: i32) -> Option<Notice> {
    if license.contains(&year.to_string()) || license.contains(&(year - 1).to_string()) {
        return None;
    }
    Some(
        Notice::new(256, "Possibly missing current copyright year")
            .with_details(format!("possibly expecting '{year}'"))
            .with_filename(LICENSE.filename),
    )
}
