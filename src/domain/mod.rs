mod confirmation_token;
mod pending_confirmation;
mod subscriber_email;
// allow external `use` statements to skip `subscriber_email` etc
pub use confirmation_token::ConfirmationToken;
pub use pending_confirmation::PendingConfirmation;
pub use subscriber_email::SubscriberEmail;
