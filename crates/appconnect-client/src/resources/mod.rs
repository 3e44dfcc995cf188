//! Typed wrappers over App Store Connect resources
//!
//! Each wrapper is a method on [`Client`](crate::Client) mapping to one REST
//! call (or a short fixed sequence of them). App-scoped calls read the app ID
//! from the credential bundle and fail with a config error when it is unset.

pub mod apps;
pub mod builds;
pub mod in_app_purchases;
pub mod release;
pub mod resolution_center;
pub mod reviews;
pub mod screenshots;
pub mod subscriptions;
pub mod testflight;
pub mod versions;

pub use apps::{App, AppAttributes, AppInfo, AppInfoAttributes};
pub use builds::{Build, BuildAttributes, BuildProcessingState};
pub use in_app_purchases::{InAppPurchase, InAppPurchaseAttributes, InAppPurchaseType};
pub use release::{
    PhasedRelease, PhasedReleaseAttributes, PhasedReleaseState, PreOrder, PreOrderAttributes,
    ReviewSubmission, ReviewSubmissionAttributes,
};
pub use resolution_center::ReviewMessage;
pub use reviews::{CustomerReview, CustomerReviewAttributes, ReviewResponse, ReviewSort};
pub use screenshots::{Screenshot, ScreenshotAttributes, ScreenshotSet, ScreenshotSetAttributes};
pub use subscriptions::{
    Subscription, SubscriptionAttributes, SubscriptionGroup, SubscriptionGroupAttributes,
    SubscriptionLocalization, SubscriptionLocalizationAttributes,
};
pub use testflight::{
    BetaGroup, BetaGroupAttributes, BetaReviewState, BetaReviewSubmission, BetaTester,
    BetaTesterAttributes, TesterInviteType,
};
pub use versions::{
    AppStoreVersion, LocalizationOutcome, LocalizationUpdate, Platform, VersionAttributes,
    VersionLocalization, VersionLocalizationAttributes,
};

/// Join values for a comma-separated filter parameter
pub(crate) fn join_filter<I, S>(values: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .map(|v| v.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(",")
}
