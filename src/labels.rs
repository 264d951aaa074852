//! Intent label taxonomy: fine-grained phrases sent to the zero-shot model and the
//! coarse scam-signal categories they collapse into.
//!
//! The mapping is a total `match` on [`FineLabel`], so adding a phrase without a
//! category does not compile. Candidate lists coming from configuration are checked
//! against it once at startup ([`validate_candidates`]).

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// Coarse scam-signal category. Declaration order is alphabetical and doubles as the
/// tie-break order when aggregated scores are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GenericLabel {
    #[serde(rename = "Channel Shifting Proposal")]
    ChannelShiftingProposal,
    #[serde(rename = "Financial Gains Opportunity")]
    FinancialGainsOpportunity,
    #[serde(rename = "Flattery")]
    Flattery,
    #[serde(rename = "Genuinity")]
    Genuinity,
    #[serde(rename = "Misidentification")]
    Misidentification,
    #[serde(rename = "Personal Info Seeking")]
    PersonalInfoSeeking,
    #[serde(rename = "Seeking Financial Support")]
    SeekingFinancialSupport,
    #[serde(rename = "Sense of Urgency")]
    SenseOfUrgency,
}

impl GenericLabel {
    pub const ALL: [GenericLabel; 8] = [
        GenericLabel::ChannelShiftingProposal,
        GenericLabel::FinancialGainsOpportunity,
        GenericLabel::Flattery,
        GenericLabel::Genuinity,
        GenericLabel::Misidentification,
        GenericLabel::PersonalInfoSeeking,
        GenericLabel::SeekingFinancialSupport,
        GenericLabel::SenseOfUrgency,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            GenericLabel::ChannelShiftingProposal => "Channel Shifting Proposal",
            GenericLabel::FinancialGainsOpportunity => "Financial Gains Opportunity",
            GenericLabel::Flattery => "Flattery",
            GenericLabel::Genuinity => "Genuinity",
            GenericLabel::Misidentification => "Misidentification",
            GenericLabel::PersonalInfoSeeking => "Personal Info Seeking",
            GenericLabel::SeekingFinancialSupport => "Seeking Financial Support",
            GenericLabel::SenseOfUrgency => "Sense of Urgency",
        }
    }

    /// The no-signal category; never flagged.
    #[inline]
    pub fn is_benign(self) -> bool {
        self == GenericLabel::Genuinity
    }

    /// Fine labels that collapse into this category.
    pub fn members(self) -> impl Iterator<Item = FineLabel> {
        FineLabel::ALL.into_iter().filter(move |f| f.generic() == self)
    }
}

impl fmt::Display for GenericLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Phrase-level intent label, passed verbatim to the classifier as a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FineLabel {
    WrongNumber,
    AccidentalApology,
    Misidentification,
    FriendlyFlattery,
    Complimenting,
    PersonalInfoSeeking,
    InvestmentMention,
    InvestmentOffering,
    FinancialSuccessBragging,
    SwitchToWhatsApp,
    MoveToTelegram,
    ContinueOnMessenger,
    UseWeChatOrLine,
    DownloadOtherPlatform,
    PrivatePhoneCall,
    VideoCallInstead,
    SwitchToEmail,
    OtherChatApps,
    AltruisticManipulation,
    VerificationFee,
    WithdrawalBlock,
    UrgentDepositRequest,
    ScarcityPressure,
    Benign,
}

impl FineLabel {
    pub const ALL: [FineLabel; 24] = [
        FineLabel::WrongNumber,
        FineLabel::AccidentalApology,
        FineLabel::Misidentification,
        FineLabel::FriendlyFlattery,
        FineLabel::Complimenting,
        FineLabel::PersonalInfoSeeking,
        FineLabel::InvestmentMention,
        FineLabel::InvestmentOffering,
        FineLabel::FinancialSuccessBragging,
        FineLabel::SwitchToWhatsApp,
        FineLabel::MoveToTelegram,
        FineLabel::ContinueOnMessenger,
        FineLabel::UseWeChatOrLine,
        FineLabel::DownloadOtherPlatform,
        FineLabel::PrivatePhoneCall,
        FineLabel::VideoCallInstead,
        FineLabel::SwitchToEmail,
        FineLabel::OtherChatApps,
        FineLabel::AltruisticManipulation,
        FineLabel::VerificationFee,
        FineLabel::WithdrawalBlock,
        FineLabel::UrgentDepositRequest,
        FineLabel::ScarcityPressure,
        FineLabel::Benign,
    ];

    /// Candidate phrase as the zero-shot model sees it.
    pub fn phrase(self) -> &'static str {
        match self {
            FineLabel::WrongNumber => "Wrong Number",
            FineLabel::AccidentalApology => "Accidental Apology",
            FineLabel::Misidentification => "Misidentification",
            FineLabel::FriendlyFlattery => "Friendly Flattery",
            FineLabel::Complimenting => "Complimenting",
            FineLabel::PersonalInfoSeeking => "Personal Info Seeking",
            FineLabel::InvestmentMention => "Investment Mention",
            FineLabel::InvestmentOffering => "Investment Offering",
            FineLabel::FinancialSuccessBragging => "Financial Success Bragging",
            FineLabel::SwitchToWhatsApp => "asking to switch to WhatsApp for private messaging",
            FineLabel::MoveToTelegram => "directly requesting to move the chat to Telegram app",
            FineLabel::ContinueOnMessenger => {
                "specifically suggesting to continue talking on Facebook Messenger"
            }
            FineLabel::UseWeChatOrLine => {
                "inviting to use WeChat or Line instead of current platform"
            }
            FineLabel::DownloadOtherPlatform => {
                "proposing to download and use a different messaging platform"
            }
            FineLabel::PrivatePhoneCall => {
                "requesting a phone call to continue the conversation privately"
            }
            FineLabel::VideoCallInstead => "asking for a video call instead of text messaging",
            FineLabel::SwitchToEmail => "suggesting to switch all communication to email",
            FineLabel::OtherChatApps => {
                "mentioning downloading other chat apps for better communication"
            }
            FineLabel::AltruisticManipulation => "Altruistic Manipulation",
            FineLabel::VerificationFee => "Verification Fee",
            FineLabel::WithdrawalBlock => "Withdrawal Block",
            FineLabel::UrgentDepositRequest => "Urgent Deposit Request",
            FineLabel::ScarcityPressure => "Scarcity Pressure",
            FineLabel::Benign => "Benign",
        }
    }

    pub fn generic(self) -> GenericLabel {
        use FineLabel::*;
        match self {
            WrongNumber | AccidentalApology | Misidentification => GenericLabel::Misidentification,
            FriendlyFlattery | Complimenting => GenericLabel::Flattery,
            PersonalInfoSeeking => GenericLabel::PersonalInfoSeeking,
            InvestmentMention | InvestmentOffering | FinancialSuccessBragging => {
                GenericLabel::FinancialGainsOpportunity
            }
            SwitchToWhatsApp | MoveToTelegram | ContinueOnMessenger | UseWeChatOrLine
            | DownloadOtherPlatform | PrivatePhoneCall | VideoCallInstead | SwitchToEmail
            | OtherChatApps => GenericLabel::ChannelShiftingProposal,
            AltruisticManipulation | VerificationFee | WithdrawalBlock | UrgentDepositRequest => {
                GenericLabel::SeekingFinancialSupport
            }
            ScarcityPressure => GenericLabel::SenseOfUrgency,
            Benign => GenericLabel::Genuinity,
        }
    }

    /// Exact (case-sensitive) reverse lookup of [`FineLabel::phrase`].
    pub fn from_phrase(phrase: &str) -> Option<FineLabel> {
        FineLabel::ALL.into_iter().find(|f| f.phrase() == phrase)
    }
}

impl fmt::Display for FineLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.phrase())
    }
}

/// Default candidate list for the classifier: every fine phrase, declaration order.
pub fn candidate_labels() -> Vec<String> {
    FineLabel::ALL.iter().map(|f| f.phrase().to_string()).collect()
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LabelMapError {
    #[error("candidate label `{0}` has no generic category")]
    Unknown(String),
    #[error("candidate list is missing fine label `{0}`")]
    Missing(&'static str),
    #[error("candidate label `{0}` is listed more than once")]
    Duplicate(String),
}

/// Check a configured candidate list against the mapping: it must name every fine
/// label exactly once and nothing else.
pub fn validate_candidates(candidates: &[String]) -> Result<(), LabelMapError> {
    let mut seen = HashSet::with_capacity(candidates.len());
    for c in candidates {
        let fine = FineLabel::from_phrase(c).ok_or_else(|| LabelMapError::Unknown(c.clone()))?;
        if !seen.insert(fine) {
            return Err(LabelMapError::Duplicate(c.clone()));
        }
    }
    if let Some(missing) = FineLabel::ALL.into_iter().find(|f| !seen.contains(f)) {
        return Err(LabelMapError::Missing(missing.phrase()));
    }
    Ok(())
}
