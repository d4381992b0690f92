//! Domain models for Formlink.

pub mod form;
pub mod policy_settings;
pub mod submission;
pub mod subscription;

pub use form::{
    CreateFormRequest, FormConfig, FormCreationRecord, FormListResponse, FormResponse,
    PublicFormResponse, QuotaResponse, UpdateFormRequest,
};
pub use policy_settings::{
    LifespanUnit, PolicySettings, PolicySettingsResponse, UpdatePolicyRequest,
    UpdatePolicyResponse, MAX_LINK_LIFESPAN_MS,
};
pub use submission::{Submission, SubmissionListResponse, SubmissionResponse, SubmitFormRequest};
pub use subscription::{
    CurrentSubscriptionResponse, NewSubscription, PaymentOutcome, PaymentWebhookEvent, PlanTerms,
    Subscription, SubscriptionResponse, SubscriptionStatus,
};
