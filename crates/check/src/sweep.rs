//! Whole-repository sweeps: every file of one repository, checked in turn.

use crate::Engine;
use crate::checker::CheckContext;
use crate::engine::{MISSING_REPO, merge, require};
use crate::error::{ErrorKind, Result};
use crate::options::CheckOptions;
use crate::progress::Progress;
use crate::repos::RepoCode;
use exn::ResultExt;
use std::ops::ControlFlow;
use tcv_notice::{Notice, RawCheckResult};
use time::UtcDateTime;
use tracing::instrument;

/// How a file is labelled in notices: a book ID where there is one,
/// otherwise a short name derived from its path.
#[derive(Debug, Clone, PartialEq, Eq)]
struct FileCode {
    code: String,
    book_id: Option<String>,
}

impl Engine {
    fn file_code(&self, path: &str) -> FileCode {
        let filename = path.rsplit('/').next().unwrap_or(path);
        let (stem, extension) = filename.rsplit_once('.').unwrap_or((filename, ""));
        let extension = extension.to_lowercase();

        if extension == "usfm" || extension == "tsv" {
            let start = stem.char_indices().rev().nth(2).map_or(0, |(index, _)| index);
            let code = stem[start..].to_uppercase();
            let book_id = self.books.is_valid(&code).then(|| code.clone());
            return FileCode { code, book_id };
        }
        if let Some((first, _)) = path.split_once('/')
            && self.books.is_valid(first)
        {
            let code = first.to_uppercase();
            return FileCode { book_id: Some(code.clone()), code };
        }
        if extension == "md" && matches!(stem, "01" | "title" | "sub-title") {
            let mut folders = path.rsplit('/').skip(1);
            if let Some(parent) = folders.next() {
                return FileCode { code: parent.to_string(), book_id: None };
            }
        }
        FileCode { code: stem.to_string(), book_id: None }
    }

    /// Check every file of `owner/repo_name` at `git_ref`.
    ///
    /// The repository archive is downloaded once and every file read from
    /// it. `progress` is told about each file and can stop the sweep early.
    #[instrument(skip(self, progress, options))]
    pub async fn check_repo<F>(
        &self,
        owner: &str,
        repo_name: &str,
        git_ref: &str,
        mut progress: F,
        options: &CheckOptions,
    ) -> Result<RawCheckResult>
    where
        F: FnMut(Progress) -> ControlFlow<()>,
    {
        require("owner", owner)?;
        require("repo_name", repo_name)?;
        require("git_ref", git_ref)?;
        let started = UtcDateTime::now();
        let location = format!(" in {repo_name}");

        if !self.retriever.repository_exists(owner, repo_name).await {
            tracing::info!(owner, repo = repo_name, "Repository does not exist");
            let mut notice = Notice::new(997, MISSING_REPO).with_repo_name(repo_name).with_location(&location);
            notice.owner = Some(owner.to_string());
            notice.git_ref = Some(git_ref.to_string());
            return Ok(RawCheckResult::single(notice));
        }
        let fetched = self.retriever.fetch_archive(owner, repo_name, git_ref).await.or_raise(|| ErrorKind::Retrieval)?;
        if !fetched {
            return Ok(RawCheckResult::single(archive_notice("Unable to fetch repository archive", owner, repo_name, git_ref)));
        }
        let listed = self.retriever.get_file_list(owner, repo_name, git_ref, None).await.or_raise(|| ErrorKind::Retrieval)?;
        let Some(paths) = listed else {
            tracing::warn!(owner, repo = repo_name, "Repository archive cannot be listed");
            return Ok(RawCheckResult::single(archive_notice(
                "Unable to enumerate repository archive",
                owner,
                repo_name,
                git_ref,
            )));
        };

        let language_code = repo_name.split_once('_').map_or(repo_name, |(language, _)| language);
        let repo_code = RepoCode::from_repo_name(repo_name);
        let accounted_name = format!("{owner}/{repo_name}");

        let mut result = RawCheckResult::new();
        let mut seen_license = false;
        let mut seen_manifest = false;
        let mut total = paths.len();
        let mut done = 0;
        let mut cancelled = false;
        for path in &paths {
            seen_license |= path == "LICENSE.md";
            seen_manifest |= path == "manifest.yaml";

            let FileCode { code, book_id } = self.file_code(path);
            if let (Some(skip), Some(book_id)) = (options.skip_testament, &book_id)
                && self.books.testament(book_id) == Some(skip)
            {
                tracing::debug!(path, testament = %skip, "Skipping file");
                total -= 1;
                continue;
            }

            let mut context = CheckContext::new(owner, language_code, repo_name, git_ref);
            context.repo_code = repo_code;
            context.book_id = book_id;

            let content = self.retriever.get_file(owner, repo_name, path, git_ref).await.or_raise(|| ErrorKind::Retrieval)?;
            match content {
                Some(content) => {
                    let checked = self.checkers.check_file(&context, path, &content, &location, options).await?;
                    result.accounting.record_file(&accounted_name, path, content.len());
                    merge(&mut result, checked, &context, path, &code);
                    if !path.ends_with(".md") {
                        result.add_success(format!("Checked {code} file: {path}"));
                    }
                },
                None => {
                    let mut notice = self.load_failure(&context, 996, "Failed to load", path, None).await?;
                    notice.location = Some(location.clone());
                    notice.extra = Some(code);
                    result.add_notice(notice);
                },
            }

            done += 1;
            if progress(Progress::FileChecked { filename: path.clone(), done, total }).is_break() {
                tracing::info!(repo = repo_name, done, total, "Repository check cancelled");
                cancelled = true;
                break;
            }
        }

        if !cancelled {
            if !seen_license {
                result.add_notice(missing_file_notice(946, "Missing LICENSE.md", "LICENSE", repo_name, &location));
            }
            if !seen_manifest {
                result.add_notice(missing_file_notice(947, "Missing manifest.yaml", "MANIFEST", repo_name, &location));
            }
            result.add_success(format!("Checked {owner} repo: {repo_name}"));
        }

        result.accounting.elapsed_seconds = (UtcDateTime::now() - started).as_seconds_f64();
        tracing::info!(
            repo = repo_name,
            files = result.accounting.checked_file_count,
            notices = result.notice_list.len(),
            "Checked repository"
        );
        Ok(result)
    }
}

fn archive_notice(message: &str, owner: &str, repo_name: &str, git_ref: &str) -> Notice {
    let mut notice = Notice::new(996, message).with_repo_name(repo_name).with_location(format!(" in {repo_name}"));
    notice.owner = Some(owner.to_string());
    notice.git_ref = Some(git_ref.to_string());
    notice
}

fn missing_file_notice(priority: u16, message: &str, extra: &str, repo_name: &str, location: &str) -> Notice {
    Notice::new(priority, message).with_repo_name(repo_name).with_location(location).with_extra(extra)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::books::Testament;
    use crate::checker::stub::{self, StubChecker};
    use async_trait::async_trait;
    use rstest::rstest;
    use std::sync::Arc;
    use tcv_fetch::{MockHost, Retriever};
    use tcv_store::{Store, Stores};

    const OWNER: &str = "unfoldingWord";

    fn engine(host: MockHost, stub: Arc<StubChecker>) -> Engine {
        Engine::new(Retriever::new(Arc::new(host), Stores::default()), stub::checkers(stub))
    }

    fn keep_going(_: Progress) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    fn bible() -> MockHost {
        MockHost::default().with_repo(OWNER, "en_ult", "master", [
            ("LICENSE.md", "Copyright"),
            ("manifest.yaml", "projects: []"),
            ("README.md", "# ULT"),
            ("08-RUT.usfm", "\\id RUT"),
            ("57-TIT.usfm", "\\id TIT\nBAD"),
            ("media.yaml", "x"),
        ])
    }

    #[rstest]
    #[case("57-TIT.usfm", "TIT", Some("TIT"))]
    #[case("en_tn_57-TIT.tsv", "TIT", Some("TIT"))]
    #[case("tn_1JN.tsv", "1JN", Some("1JN"))]
    #[case("twl_XYZ.tsv", "XYZ", None)]
    #[case("tit/01/02.md", "TIT", Some("TIT"))]
    #[case("translate/figs-metaphor/01.md", "figs-metaphor", None)]
    #[case("translate/figs-metaphor/title.md", "figs-metaphor", None)]
    #[case("bible/kt/god.md", "god", None)]
    #[case("LICENSE.md", "LICENSE", None)]
    #[case("manifest.yaml", "manifest", None)]
    fn test_file_code(#[case] path: &str, #[case] code: &str, #[case] book_id: Option<&str>) {
        let engine = engine(MockHost::default(), Arc::new(StubChecker::default()));
        let found = engine.file_code(path);
        assert_eq!(found.code, code);
        assert_eq!(found.book_id.as_deref(), book_id);
    }

    #[tokio::test]
    async fn test_sweep() {
        let stub = Arc::new(StubChecker::default());
        let host = Arc::new(bible());
        let engine = Engine::new(Retriever::new(host.clone(), Stores::default()), stub::checkers(stub.clone()));
        let result = engine.check_repo(OWNER, "en_ult", "master", keep_going, &CheckOptions::default()).await.unwrap();

        assert_eq!(result.success_list, [
            "Checked manifest file: manifest.yaml",
            "Checked RUT file: 08-RUT.usfm",
            "Checked TIT file: 57-TIT.usfm",
            "Checked media file: media.yaml",
            "Checked unfoldingWord repo: en_ult",
        ]);
        assert_eq!(result.notice_list.len(), 1);
        let notice = &result.notice_list[0];
        assert_eq!(notice.extra.as_deref(), Some("TIT"));
        assert_eq!(notice.book_id.as_deref(), Some("TIT"));
        assert_eq!(notice.repo_code.as_deref(), Some("LT"));
        assert_eq!(notice.filename.as_deref(), Some("57-TIT.usfm"));

        assert_eq!(result.accounting.checked_file_count, 6);
        assert_eq!(result.accounting.checked_repo_names.iter().collect::<Vec<_>>(), ["unfoldingWord/en_ult"]);
        assert_eq!(stub.contexts()[0].language_code, "en");
        // One archive download; every file is read from it.
        assert_eq!(host.calls().archive, 1);
        assert_eq!(host.calls().raw_file, 0);
    }

    #[tokio::test]
    async fn test_missing_license_and_manifest() {
        let host = MockHost::default().with_repo(OWNER, "en_ta", "master", [("translate/figs-metaphor/01.md", "# Metaphor")]);
        let engine = engine(host, Arc::new(StubChecker::default()));
        let result = engine.check_repo(OWNER, "en_ta", "master", keep_going, &CheckOptions::default()).await.unwrap();

        let found: Vec<(u16, &str, Option<&str>)> =
            result.notice_list.iter().map(|n| (n.priority, n.message.as_str(), n.extra.as_deref())).collect();
        assert_eq!(found, [
            (946, "Missing LICENSE.md", Some("LICENSE")),
            (947, "Missing manifest.yaml", Some("MANIFEST")),
        ]);
        assert_eq!(result.success_list, ["Checked unfoldingWord repo: en_ta"]);
    }

    #[tokio::test]
    async fn test_missing_repository() {
        let engine = engine(bible(), Arc::new(StubChecker::default()));
        let result = engine.check_repo(OWNER, "en_ust", "master", keep_going, &CheckOptions::default()).await.unwrap();
        assert_eq!(result.notice_list.len(), 1);
        assert_eq!(result.notice_list[0].priority, 997);
        assert_eq!(result.notice_list[0].repo_name.as_deref(), Some("en_ust"));
        assert!(result.success_list.is_empty());
    }

    #[tokio::test]
    async fn test_unfetchable_archive() {
        let host = bible().with_broken_archive(OWNER, "en_ult", "master");
        let engine = engine(host, Arc::new(StubChecker::default()));
        let result = engine.check_repo(OWNER, "en_ult", "master", keep_going, &CheckOptions::default()).await.unwrap();
        assert_eq!(result.notice_list.len(), 1);
        assert_eq!(result.notice_list[0].priority, 996);
        assert_eq!(result.notice_list[0].message, "Unable to fetch repository archive");
    }

    #[tokio::test]
    async fn test_corrupt_archive_is_fatal() {
        let stub = Arc::new(StubChecker::default());
        let host = bible().with_corrupt_archive(OWNER, "en_ult", "master");
        let engine = engine(host, stub.clone());
        let result = engine.check_repo(OWNER, "en_ult", "master", keep_going, &CheckOptions::default()).await.unwrap();
        assert_eq!(result.notice_list.len(), 1);
        assert_eq!(result.notice_list[0].priority, 996);
        assert_eq!(result.notice_list[0].message, "Unable to fetch repository archive");
        assert!(result.success_list.is_empty());
        assert_eq!(result.accounting.checked_file_count, 0);
        assert!(stub.filenames().is_empty());
    }

    /// An archive store that accepts writes but only ever reads back garbage.
    struct GarbledStore;

    #[async_trait]
    impl Store for GarbledStore {
        fn name(&self) -> &str {
            "archive"
        }

        async fn get(&self, _key: &str) -> tcv_store::error::Result<Option<Vec<u8>>> {
            Ok(Some(b"not a zip".to_vec()))
        }

        async fn set(&self, _key: &str, _value: &[u8]) -> tcv_store::error::Result<()> {
            Ok(())
        }

        async fn clear(&self) -> tcv_store::error::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_unlistable_archive_is_fatal() {
        let stub = Arc::new(StubChecker::default());
        let stores = Stores { archive: Arc::new(GarbledStore), ..Stores::default() };
        let engine = Engine::new(Retriever::new(Arc::new(bible()), stores), stub::checkers(stub.clone()));
        let result = engine.check_repo(OWNER, "en_ult", "master", keep_going, &CheckOptions::default()).await.unwrap();

        assert_eq!(result.notice_list.len(), 1);
        let notice = &result.notice_list[0];
        assert_eq!(notice.priority, 996);
        assert_eq!(notice.message, "Unable to enumerate repository archive");
        assert_eq!(notice.repo_name.as_deref(), Some("en_ult"));
        assert!(result.success_list.is_empty());
        assert!(stub.filenames().is_empty());
    }

    #[tokio::test]
    async fn test_skip_testament() {
        let stub = Arc::new(StubChecker::default());
        let engine = engine(bible(), stub.clone());
        let options = CheckOptions { skip_testament: Some(Testament::Old), ..CheckOptions::default() };
        let mut last = None;
        let result = engine
            .check_repo(
                OWNER,
                "en_ult",
                "master",
                |event| {
                    last = Some(event);
                    ControlFlow::Continue(())
                },
                &options,
            )
            .await
            .unwrap();
        assert!(!stub.filenames().contains(&"08-RUT.usfm".to_string()));
        assert_eq!(result.accounting.checked_file_count, 5);
        assert_eq!(last, Some(Progress::FileChecked { filename: "media.yaml".into(), done: 5, total: 5 }));
    }

    #[tokio::test]
    async fn test_unknown_extension() {
        let host = MockHost::default().with_repo(OWNER, "en_ult", "master", [
            ("LICENSE.md", "Copyright"),
            ("manifest.yaml", "projects: []"),
            ("notes.xyz", "hello"),
        ]);
        let engine = engine(host, Arc::new(StubChecker::default()));
        let result = engine.check_repo(OWNER, "en_ult", "master", keep_going, &CheckOptions::default()).await.unwrap();
        assert_eq!(result.notice_list.len(), 1);
        assert_eq!(result.notice_list[0].priority, 995);
        assert_eq!(result.notice_list[0].extra.as_deref(), Some("notes"));
    }

    #[tokio::test]
    async fn test_cancellation() {
        let engine = engine(bible(), Arc::new(StubChecker::default()));
        let mut seen = 0;
        let result = engine
            .check_repo(
                OWNER,
                "en_ult",
                "master",
                |_| {
                    seen += 1;
                    if seen == 2 { ControlFlow::Break(()) } else { ControlFlow::Continue(()) }
                },
                &CheckOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(seen, 2);
        assert_eq!(result.accounting.checked_file_count, 2);
        assert!(result.notice_list.is_empty());
        assert!(!result.success_list.iter().any(|success| success.starts_with("Checked unfoldingWord repo")));
    }

    #[tokio::test]
    async fn test_checker_error_propagates() {
        let host = MockHost::default().with_repo(OWNER, "en_ult", "master", [("57-TIT.usfm", "EXPLODE")]);
        let engine = engine(host, Arc::new(StubChecker::default()));
        let err = engine.check_repo(OWNER, "en_ult", "master", keep_going, &CheckOptions::default()).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Checker(_)));
    }
}
