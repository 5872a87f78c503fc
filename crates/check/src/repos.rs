//! Logical repository codes, their naming rules, and dataset modes.

use crate::books::Testament;
use crate::error::{Error, ErrorKind};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Ref holding the current-format variants (`TN2`, `TQ2`, …).
pub const NEW_FORMAT_REF: &str = "newFormat";

/// A logical repository in a resource set.
///
/// Codes ending in `2` are the current-format variants of a base repository
/// and live on the [`NEW_FORMAT_REF`] ref of the base repository.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepoCode {
    #[display("UHB")]
    Uhb,
    #[display("UGNT")]
    Ugnt,
    #[display("LT")]
    Lt,
    #[display("ST")]
    St,
    #[display("TA")]
    Ta,
    #[display("TW")]
    Tw,
    #[display("TWL")]
    Twl,
    #[display("TN")]
    Tn,
    #[display("TN2")]
    Tn2,
    #[display("TQ")]
    Tq,
    #[display("TQ2")]
    Tq2,
    #[display("SN")]
    Sn,
    #[display("SQ")]
    Sq,
    #[display("UGL")]
    Ugl,
    #[display("UHAL")]
    Uhal,
    #[display("OBS")]
    Obs,
    #[display("OBS-TWL")]
    ObsTwl,
    #[display("OBS-TN")]
    ObsTn,
    #[display("OBS-TN2")]
    ObsTn2,
    #[display("OBS-TQ")]
    ObsTq,
    #[display("OBS-TQ2")]
    ObsTq2,
    #[display("OBS-SN")]
    ObsSn,
    #[display("OBS-SQ")]
    ObsSq,
}

impl RepoCode {
    pub const ALL: [RepoCode; 23] = [
        Self::Uhb,
        Self::Ugnt,
        Self::Lt,
        Self::St,
        Self::Ta,
        Self::Tw,
        Self::Twl,
        Self::Tn,
        Self::Tn2,
        Self::Tq,
        Self::Tq2,
        Self::Sn,
        Self::Sq,
        Self::Ugl,
        Self::Uhal,
        Self::Obs,
        Self::ObsTwl,
        Self::ObsTn,
        Self::ObsTn2,
        Self::ObsTq,
        Self::ObsTq2,
        Self::ObsSn,
        Self::ObsSq,
    ];

    /// The repository a current-format variant lives in.
    pub fn base(self) -> Self {
        match self {
            Self::Tn2 => Self::Tn,
            Self::Tq2 => Self::Tq,
            Self::ObsTn2 => Self::ObsTn,
            Self::ObsTq2 => Self::ObsTq,
            other => other,
        }
    }

    pub fn is_new_format(self) -> bool {
        self.base() != self
    }

    /// The ref to check: [`NEW_FORMAT_REF`] for current-format variants,
    /// otherwise `default_ref`.
    pub fn git_ref(self, default_ref: &str) -> &str {
        if self.is_new_format() { NEW_FORMAT_REF } else { default_ref }
    }

    pub fn is_original_language(self) -> bool {
        matches!(self, Self::Uhb | Self::Ugnt)
    }

    /// Language the repository is always in, whatever language was requested.
    pub fn fixed_language(self) -> Option<&'static str> {
        match self {
            Self::Uhb => Some("hbo"),
            Self::Ugnt => Some("el-x-koine"),
            _ => None,
        }
    }

    /// Repository name for this code in `language_code`.
    ///
    /// Fixed-language repositories ignore `language_code`.
    pub fn repo_name(self, language_code: &str) -> String {
        let language_code = self.fixed_language().unwrap_or(language_code);
        let suffix = match self.base() {
            Self::Lt if language_code == "en" => "ult".to_string(),
            Self::Lt => "glt".to_string(),
            Self::St if language_code == "en" => "ust".to_string(),
            Self::St => "gst".to_string(),
            base => base.to_string().to_lowercase(),
        };
        format!("{language_code}_{suffix}")
    }

    /// Best guess at the code of a repository from its name (`en_tn` is
    /// `TN`, `fr_glt` is `LT`).
    pub fn from_repo_name(repo_name: &str) -> Option<Self> {
        let (_, suffix) = repo_name.split_once('_')?;
        match suffix.to_lowercase().as_str() {
            "ult" | "glt" => Some(Self::Lt),
            "ust" | "gst" => Some(Self::St),
            other => other.parse().ok(),
        }
    }

    /// Priority of the notice raised when this repository's book file can't
    /// be loaded. Study notes and questions are optional extras.
    pub fn load_failure_priority(self) -> u16 {
        match self {
            Self::Sn | Self::Sq => 196,
            _ => 996,
        }
    }
}

impl FromStr for RepoCode {
    type Err = Error;

    /// Parses case-insensitively. A trailing `1` names the legacy format,
    /// which is the base code (`TN1` is `TN`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        let wanted = upper.strip_suffix('1').unwrap_or(&upper);
        Self::ALL
            .into_iter()
            .find(|code| code.to_string() == wanted)
            .ok_or_else(|| exn::Exn::from(ErrorKind::InvalidArgument(format!("unknown repo code {s:?}"))))
    }
}

impl Serialize for RepoCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RepoCode {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(|_| serde::de::Error::custom(format!("unknown repo code {s:?}")))
    }
}

/// Which legacy and current-format repositories a book package includes.
#[derive(Debug, Display, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DatasetMode {
    #[default]
    #[display("DEFAULT")]
    Default,
    #[display("OLD")]
    Old,
    #[display("NEW")]
    New,
    #[display("BOTH")]
    Both,
}

impl DatasetMode {
    /// Repositories to check, in order, for a book of the given testament.
    pub fn repo_codes(self, testament: Testament) -> Vec<RepoCode> {
        use RepoCode::*;
        let original = if testament == Testament::Old { Uhb } else { Ugnt };
        match self {
            Self::Default | Self::Old => vec![original, Lt, St, Tn, Tq],
            Self::New => vec![original, Twl, Lt, St, Tn2, Tq2, Sn, Sq],
            Self::Both => vec![original, Twl, Lt, St, Tn, Tn2, Tq, Tq2, Sn, Sq],
        }
    }
}

impl FromStr for DatasetMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "DEFAULT" => Ok(Self::Default),
            "OLD" => Ok(Self::Old),
            "NEW" => Ok(Self::New),
            "BOTH" => Ok(Self::Both),
            _ => exn::bail!(ErrorKind::InvalidArgument(format!("unknown dataset mode {s:?}"))),
        }
    }
}
