//! Component approval and enquiry workflow tests
//!
//! Runs the services against the in-memory store:
//! - Vendors submit, managers approve or reject with a reason
//! - Enquiries address one vendor and only that vendor's components
//! - Quoted enquiries cannot be deleted

mod common;

use common::{dec, Harness};
use procurement_backend::error::AppError;
use procurement_backend::services::component::RejectInput;
use procurement_backend::services::ListParams;
use shared::{ComponentPatch, ComponentStatus, EnquiryPatch, EnquiryStatus, WorkflowError};

fn is_workflow(result: &AppError, check: fn(&WorkflowError) -> bool) -> bool {
    matches!(result, AppError::Workflow(e) if check(e))
}

// ============================================================================
// Components
// ============================================================================

#[tokio::test]
async fn submitted_component_waits_for_approval() {
    let h = Harness::new();
    let component = h
        .components()
        .submit(&h.vendor, Harness::new_component("BOLT-M8"))
        .await
        .unwrap();

    assert_eq!(component.status, ComponentStatus::Pending);
    assert_eq!(component.vendor_id, h.vendor_id);

    let approved = h.components().approve(&h.manager, component.id).await.unwrap();
    assert_eq!(approved.status, ComponentStatus::Approved);

    let events = h.events(2).await;
    assert!(events.iter().any(|e| e.action == "approve" && e.to_status.as_deref() == Some("approved")));
}

#[tokio::test]
async fn only_managers_approve_components() {
    let h = Harness::new();
    let component = h
        .components()
        .submit(&h.vendor, Harness::new_component("NUT-M8"))
        .await
        .unwrap();

    let err = h.components().approve(&h.vendor, component.id).await.unwrap_err();
    assert!(matches!(err, AppError::InsufficientPermissions));

    let err = h
        .components()
        .submit(&h.manager, Harness::new_component("NUT-M10"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientPermissions));
}

#[tokio::test]
async fn rejection_needs_a_reason_and_edit_resubmits() {
    let h = Harness::new();
    let component = h
        .components()
        .submit(&h.vendor, Harness::new_component("GASKET"))
        .await
        .unwrap();

    let err = h
        .components()
        .reject(&h.manager, component.id, RejectInput { rejection_reason: None })
        .await
        .unwrap_err();
    assert!(is_workflow(&err, |e| matches!(e, WorkflowError::Validation { .. })));

    let rejected = h
        .components()
        .reject(
            &h.manager,
            component.id,
            RejectInput {
                rejection_reason: Some("Datasheet missing".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(rejected.status, ComponentStatus::Rejected);

    let edit = h
        .components()
        .edit(
            &h.vendor,
            component.id,
            ComponentPatch {
                description: Some("Datasheet attached".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(edit.resubmitted);
    assert_eq!(edit.component.status, ComponentStatus::Pending);
}

#[tokio::test]
async fn approving_twice_is_an_invalid_transition() {
    let h = Harness::new();
    let component = h.approved_component().await;

    let err = h.components().approve(&h.manager, component.id).await.unwrap_err();
    assert!(is_workflow(&err, |e| matches!(e, WorkflowError::InvalidState { .. })));
    assert_eq!(err.status_code(), axum::http::StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn duplicate_component_code_conflicts() {
    let h = Harness::new();
    h.components()
        .submit(&h.vendor, Harness::new_component("PIPE-20"))
        .await
        .unwrap();

    let err = h
        .components()
        .submit(&h.vendor, Harness::new_component("PIPE-20"))
        .await
        .unwrap_err();
    assert!(is_workflow(&err, |e| matches!(e, WorkflowError::Conflict { .. })));
}

#[tokio::test]
async fn vendors_do_not_see_each_others_components() {
    let h = Harness::new();
    let component = h.approved_component().await;
    let stranger = h.other_vendor();

    let err = h.components().get(&stranger, component.id).await.unwrap_err();
    assert_eq!(err.status_code(), axum::http::StatusCode::NOT_FOUND);

    let listed = h.components().list(&stranger, &ListParams::default()).await.unwrap();
    assert!(listed.is_empty());
    let listed = h.components().list(&h.manager, &ListParams::default()).await.unwrap();
    assert_eq!(listed.len(), 1);
}

// ============================================================================
// Enquiries
// ============================================================================

#[tokio::test]
async fn enquiry_is_raised_to_one_vendor() {
    let h = Harness::new();
    let component = h.approved_component().await;
    let enquiry = h.raised_enquiry(&component).await;

    assert_eq!(enquiry.status, EnquiryStatus::Raised);
    assert_eq!(enquiry.vendor_id, h.vendor_id);

    let seen = h.enquiries().get(&h.vendor, enquiry.id).await.unwrap();
    assert_eq!(seen.id, enquiry.id);
    let err = h.enquiries().get(&h.other_vendor(), enquiry.id).await.unwrap_err();
    assert_eq!(err.status_code(), axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn enquiry_rejects_components_of_another_vendor() {
    let h = Harness::new();
    let component = h.approved_component().await;
    let mut input = h.new_enquiry(&component, 5);
    input.vendor_id = uuid::Uuid::new_v4();

    let err = h.enquiries().create(&h.manager, input).await.unwrap_err();
    assert!(is_workflow(&err, |e| matches!(e, WorkflowError::Validation { .. })));
}

#[tokio::test]
async fn enquiry_with_zero_quantity_is_invalid() {
    let h = Harness::new();
    let component = h.approved_component().await;

    let err = h
        .enquiries()
        .create(&h.manager, h.new_enquiry(&component, 0))
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn raised_enquiry_can_be_updated_and_deleted() {
    let h = Harness::new();
    let component = h.approved_component().await;
    let enquiry = h.raised_enquiry(&component).await;

    let updated = h
        .enquiries()
        .update(
            &h.manager,
            enquiry.id,
            EnquiryPatch {
                title: Some("Urgent restock".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.title, "Urgent restock");

    h.enquiries().delete(&h.manager, enquiry.id).await.unwrap();
    let err = h.enquiries().get(&h.manager, enquiry.id).await.unwrap_err();
    assert_eq!(err.status_code(), axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn quoted_enquiry_cannot_be_deleted() {
    let h = Harness::new();
    let (_, enquiry, _) = h.sent_quotation().await;

    let err = h.enquiries().delete(&h.manager, enquiry.id).await.unwrap_err();
    assert!(is_workflow(&err, |e| matches!(e, WorkflowError::Conflict { .. })));

    let still_there = h.enquiries().get(&h.manager, enquiry.id).await.unwrap();
    assert_eq!(still_there.status, EnquiryStatus::Quoted);
}

#[tokio::test]
async fn vendor_declines_enquiry_with_reason() {
    let h = Harness::new();
    let component = h.approved_component().await;
    let enquiry = h.raised_enquiry(&component).await;

    let rejected = h
        .enquiries()
        .reject(
            &h.vendor,
            enquiry.id,
            RejectInput {
                rejection_reason: Some("Out of stock until Q3".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(rejected.status, EnquiryStatus::Rejected);
    assert_eq!(rejected.items[0].quantity, dec(10));
}
