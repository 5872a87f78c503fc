//! Book identifiers.
//!
//! Book IDs are the three-character USFM codes (`GEN`, `TIT`, `1JN`, …).
//! Lookups are case-insensitive.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Testament {
    #[display("old")]
    Old,
    #[display("new")]
    New,
    /// Front and back matter.
    #[display("other")]
    Other,
}

/// Lookup of canonical book information.
pub trait BookCatalog {
    fn is_valid(&self, book_id: &str) -> bool;

    /// Numbered filename stem, e.g. `57-TIT` for `TIT`.
    fn numbered_filename(&self, book_id: &str) -> Option<String>;

    fn testament(&self, book_id: &str) -> Option<Testament>;

    fn chapter_count(&self, book_id: &str) -> Option<u16>;
}

pub type CatalogHandle = Arc<dyn BookCatalog + Send + Sync>;

/// (ID, USFM number, chapters). Front and back matter have no chapters.
static BOOKS: &[(&str, &str, u16)] = &[
    ("FRT", "A0", 0),
    ("GEN", "01", 50),
    ("EXO", "02", 40),
    ("LEV", "03", 27),
    ("NUM", "04", 36),
    ("DEU", "05", 34),
    ("JOS", "06", 24),
    ("JDG", "07", 21),
    ("RUT", "08", 4),
    ("1SA", "09", 31),
    ("2SA", "10", 24),
    ("1KI", "11", 22),
    ("2KI", "12", 25),
    ("1CH", "13", 29),
    ("2CH", "14", 36),
    ("EZR", "15", 10),
    ("NEH", "16", 13),
    ("EST", "17", 10),
    ("JOB", "18", 42),
    ("PSA", "19", 150),
    ("PRO", "20", 31),
    ("ECC", "21", 12),
    ("SNG", "22", 8),
    ("ISA", "23", 66),
    ("JER", "24", 52),
    ("LAM", "25", 5),
    ("EZK", "26", 48),
    ("DAN", "27", 12),
    ("HOS", "28", 14),
    ("JOL", "29", 3),
    ("AMO", "30", 9),
    ("OBA", "31", 1),
    ("JON", "32", 4),
    ("MIC", "33", 7),
    ("NAM", "34", 3),
    ("HAB", "35", 3),
    ("ZEP", "36", 3),
    ("HAG", "37", 2),
    ("ZEC", "38", 14),
    ("MAL", "39", 4),
    ("MAT", "41", 28),
    ("MRK", "42", 16),
    ("LUK", "43", 24),
    ("JHN", "44", 21),
    ("ACT", "45", 28),
    ("ROM", "46", 16),
    ("1CO", "47", 16),
    ("2CO", "48", 13),
    ("GAL", "49", 6),
    ("EPH", "50", 6),
    ("PHP", "51", 4),
    ("COL", "52", 4),
    ("1TH", "53", 5),
    ("2TH", "54", 3),
    ("1TI", "55", 6),
    ("2TI", "56", 4),
    ("TIT", "57", 3),
    ("PHM", "58", 1),
    ("HEB", "59", 13),
    ("JAS", "60", 5),
    ("1PE", "61", 5),
    ("2PE", "62", 3),
    ("1JN", "63", 5),
    ("2JN", "64", 1),
    ("3JN", "65", 1),
    ("JUD", "66", 1),
    ("REV", "67", 22),
    ("BAK", "A1", 0),
];

/// The 66-book Protestant canon plus front and back matter, numbered the
/// USFM way (GEN=01 … MAL=39, MAT=41 … REV=67).
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardBooks;

impl StandardBooks {
    fn find(book_id: &str) -> Option<&'static (&'static str, &'static str, u16)> {
        BOOKS.iter().find(|(id, _, _)| id.eq_ignore_ascii_case(book_id))
    }
}

impl BookCatalog for StandardBooks {
    fn is_valid(&self, book_id: &str) -> bool {
        Self::find(book_id).is_some()
    }

    fn numbered_filename(&self, book_id: &str) -> Option<String> {
        Self::find(book_id).map(|(id, number, _)| format!("{number}-{id}"))
    }

    fn testament(&self, book_id: &str) -> Option<Testament> {
        let (_, number, _) = Self::find(book_id)?;
        Some(match number.parse::<u8>() {
            Ok(n) if n < 40 => Testament::Old,
            Ok(_) => Testament::New,
            Err(_) => Testament::Other,
        })
    }

    fn chapter_count(&self, book_id: &str) -> Option<u16> {
        Self::find(book_id).map(|(_, _, chapters)| *chapters).filter(|chapters| *chapters > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("GEN", "01-GEN", Testament::Old, 50)]
    #[case("mal", "39-MAL", Testament::Old, 4)]
    #[case("MAT", "41-MAT", Testament::New, 28)]
    #[case("TIT", "57-TIT", Testament::New, 3)]
    #[case("1JN", "63-1JN", Testament::New, 5)]
    #[case("REV", "67-REV", Testament::New, 22)]
    fn test_canonical_books(#[case] id: &str, #[case] filename: &str, #[case] testament: Testament, #[case] chapters: u16) {
        let books = StandardBooks;
        assert!(books.is_valid(id));
        assert_eq!(books.numbered_filename(id).as_deref(), Some(filename));
        assert_eq!(books.testament(id), Some(testament));
        assert_eq!(books.chapter_count(id), Some(chapters));
    }

    #[test]
    fn test_front_and_back_matter() {
        let books = StandardBooks;
        assert!(books.is_valid("FRT"));
        assert_eq!(books.testament("BAK"), Some(Testament::Other));
        assert_eq!(books.chapter_count("FRT"), None);
    }

    #[rstest]
    #[case("XYZ")]
    #[case("OBS")]
    #[case("")]
    #[case("TITUS")]
    fn test_invalid(#[case] id: &str) {
        let books = StandardBooks;
        assert!(!books.is_valid(id));
        assert_eq!(books.numbered_filename(id), None);
        assert_eq!(books.testament(id), None);
    }

    #[test]
    fn test_canon_size() {
        let canonical = BOOKS.iter().filter(|(_, _, chapters)| *chapters > 0).count();
        assert_eq!(canonical, 66);
        assert_eq!(StandardBooks.testament("MAL"), Some(Testament::Old));
    }
}
