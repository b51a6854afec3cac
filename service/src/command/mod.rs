//! [`Command`] definition.

pub mod accept_rental_request;
pub mod authorize_user_session;
pub mod claim_offline_payment;
pub mod confirm_offline_payment;
pub mod confirm_termination;
pub mod create_card_payment;
pub mod create_property;
pub mod create_rental_request;
pub mod decline_lease;
pub mod reject_offline_payment;
pub mod reject_rental_request;
pub mod settle_card_payment;
pub mod sign_lease;
pub mod terminate_lease;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    accept_rental_request::AcceptRentalRequest,
    authorize_user_session::AuthorizeUserSession,
    claim_offline_payment::ClaimOfflinePayment,
    confirm_offline_payment::ConfirmOfflinePayment,
    confirm_termination::ConfirmTermination,
    create_card_payment::CreateCardPayment, create_property::CreateProperty,
    create_rental_request::CreateRentalRequest, decline_lease::DeclineLease,
    reject_offline_payment::RejectOfflinePayment,
    reject_rental_request::RejectRentalRequest,
    settle_card_payment::SettleCardPayment, sign_lease::SignLease,
    terminate_lease::TerminateLease,
};
