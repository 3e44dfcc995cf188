//! CLI commands

mod apps;
mod builds;
mod completions;
mod config;
mod groups;
mod iap;
mod messages;
mod phased_release;
mod pre_order;
mod release;
mod reviews;
mod screenshots;
mod submit;
mod subscriptions;
mod testers;
mod token;
mod versions;

pub use apps::AppsCommand;
pub use builds::BuildsCommand;
pub use completions::CompletionsCommand;
pub use config::ConfigCommand;
pub use groups::GroupsCommand;
pub use iap::IapCommand;
pub use messages::MessagesCommand;
pub use phased_release::PhasedReleaseCommand;
pub use pre_order::PreOrderCommand;
pub use release::ReleaseCommand;
pub use reviews::ReviewsCommand;
pub use screenshots::ScreenshotsCommand;
pub use submit::SubmitCommand;
pub use subscriptions::SubscriptionsCommand;
pub use testers::TestersCommand;
pub use token::TokenCommand;
pub use versions::VersionsCommand;
