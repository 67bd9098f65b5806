//! Splashes: transient, tagged, time-boxed needs.
//!
//! A splash biases goal selection towards targets that share its tags for
//! as long as it lives. Every kind has a fixed tag list and lifetime.

use humanity_types::TagSet;

/// What caused a splash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SplashKind {
    /// Balance at or below zero.
    NeedMoney,
    /// Just lost a job.
    JobLoss,
    /// Just moved to a better-paying job.
    CareerAdvancement,
    /// Just became pregnant.
    Pregnancy,
    /// Just became a parent.
    ChildBirth,
}

impl SplashKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::NeedMoney,
        Self::JobLoss,
        Self::CareerAdvancement,
        Self::Pregnancy,
        Self::ChildBirth,
    ];

    /// Snake-case name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::NeedMoney => "need_money",
            Self::JobLoss => "job_loss",
            Self::CareerAdvancement => "career_advancement",
            Self::Pregnancy => "pregnancy",
            Self::ChildBirth => "child_birth",
        }
    }

    /// Tag names the splash carries.
    pub const fn tag_names(self) -> &'static [&'static str] {
        match self {
            Self::NeedMoney => &["money", "well-being", "career"],
            Self::JobLoss => &["money", "stress", "career"],
            Self::CareerAdvancement => &["career", "money", "well-being"],
            Self::Pregnancy => &["family", "health", "responsibility"],
            Self::ChildBirth => &["family", "happiness", "responsibility"],
        }
    }

    /// Hours the splash stays active.
    pub const fn lifetime_hours(self) -> u64 {
        match self {
            Self::NeedMoney => 24,
            Self::JobLoss => 72,
            Self::CareerAdvancement => 48,
            Self::Pregnancy => 6480,
            Self::ChildBirth => 168,
        }
    }

    /// Whether the splash counts towards workplace stress.
    pub const fn is_distressing(self) -> bool {
        matches!(self, Self::JobLoss)
    }
}

/// One active splash on an agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Splash {
    /// Cause.
    pub kind: SplashKind,
    /// Interned tags.
    pub tags: TagSet,
    /// Hour the splash appeared.
    pub appeared_at: u64,
    /// Hours it stays active.
    pub lifetime: u64,
}

impl Splash {
    /// Whether the splash has outlived its lifetime at `hour`.
    pub const fn is_expired(&self, hour: u64) -> bool {
        hour.saturating_sub(self.appeared_at) > self.lifetime
    }
}
