pub mod slackwatch;
pub mod views;
