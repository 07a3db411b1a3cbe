use super::common::*;
use crate::workflows::applications::domain::{
    ApplicationId, ApplicationStatus, DocumentId, DocumentTypeId, StudentId, VerificationStatus,
};
use crate::workflows::applications::intake::IntakeViolation;
use crate::workflows::applications::lifecycle::{StatusChange, SubmissionBlocked, TransitionError};
use crate::workflows::applications::repository::{ApplicationRepository, RepositoryError};
use crate::workflows::applications::service::{
    ApplicationServiceError, ScholarshipApplicationService, UploadRejected, VerificationDecision,
};
use std::sync::Arc;

fn advance_to(service: &TestService, id: &ApplicationId, status: ApplicationStatus) {
    service
        .advance(
            id,
            StatusChange {
                status,
                approved_amount: None,
                remarks: None,
            },
        )
        .expect("transition allowed");
}

#[test]
fn create_draft_assigns_sequential_ids_and_normalizes_profile() {
    let (service, repository, _, notices) = build_service();

    let first = service.create_draft(draft()).expect("draft is valid");
    let second = service.create_draft(draft()).expect("draft is valid");

    assert_ne!(first.application_id, second.application_id);
    assert!(first.application_id.0.starts_with("app-"));
    assert_eq!(first.status, ApplicationStatus::Draft);
    assert_eq!(first.profile.grade_point, 1.50);
    assert!(repository
        .fetch(&first.application_id)
        .expect("fetch succeeds")
        .is_some());
    assert!(notices.events().is_empty(), "drafts are silent");
}

#[test]
fn create_draft_propagates_intake_violations() {
    let (service, repository, _, _) = build_service();
    let mut draft = draft();
    draft.financial.household_size = 0;

    match service.create_draft(draft) {
        Err(ApplicationServiceError::Intake(IntakeViolation::EmptyHousehold)) => {}
        other => panic!("expected intake violation, got {other:?}"),
    }
    assert!(repository
        .records
        .lock()
        .expect("repository mutex poisoned")
        .is_empty());
}

#[test]
fn update_draft_rewrites_profile_until_submission() {
    let (service, _, _, _) = build_service();
    let record = ready_draft(&service);

    let mut changed = draft();
    changed.requested_amount = 30_000;
    changed.academic.general_average = "97".to_string();
    let updated = service
        .update_draft(&record.application_id, changed.clone())
        .expect("draft editable");
    assert_eq!(updated.requested_amount, 30_000);
    assert_eq!(updated.profile.grade_point, 1.00);
    assert_eq!(updated.created_at, record.created_at);

    service.submit(&record.application_id).expect("complete draft");
    match service.update_draft(&record.application_id, changed) {
        Err(ApplicationServiceError::Intake(IntakeViolation::Locked(
            ApplicationStatus::Submitted,
        ))) => {}
        other => panic!("expected locked draft, got {other:?}"),
    }
}

#[test]
fn update_draft_keeps_the_owner() {
    let (service, _, _, _) = build_service();
    let record = service.create_draft(draft()).expect("draft is valid");
    let mut other = draft();
    other.student_id = StudentId("stu-9999".to_string());

    match service.update_draft(&record.application_id, other) {
        Err(ApplicationServiceError::Intake(IntakeViolation::StudentChanged)) => {}
        other => panic!("expected student change rejection, got {other:?}"),
    }
}

#[test]
fn list_applications_only_returns_the_students_records() {
    let (service, _, _, _) = build_service();
    let first = service.create_draft(draft()).expect("draft is valid");
    let second = service.create_draft(draft()).expect("draft is valid");
    let mut stranger = draft();
    stranger.student_id = StudentId("stu-0001".to_string());
    service.create_draft(stranger).expect("draft is valid");

    let listed = service
        .list_applications(&student())
        .expect("list succeeds");

    let ids: Vec<ApplicationId> = listed.into_iter().map(|record| record.application_id).collect();
    assert_eq!(ids, vec![first.application_id, second.application_id]);
}

#[test]
fn get_propagates_not_found() {
    let (service, _, _, _) = build_service();

    match service.get(&ApplicationId("missing".to_string())) {
        Err(ApplicationServiceError::Repository(RepositoryError::NotFound)) => {}
        other => panic!("expected not found error, got {other:?}"),
    }
}

#[test]
fn required_types_are_listed_required_first() {
    let (service, _, _, _) = build_service();

    let types = service.required_types().expect("catalog available");

    assert_eq!(types.len(), 4);
    assert!(types[..3].iter().all(|document_type| document_type.required));
    assert!(!types[3].required);
}

#[test]
fn upload_validates_owner_file_and_catalog() {
    let (service, _, documents, _) = build_service();
    let record = service.create_draft(draft()).expect("draft is valid");
    let id = &record.application_id;

    let mut foreign = upload(ENROLLMENT);
    foreign.student_id = StudentId("stu-0001".to_string());
    assert!(matches!(
        service.upload_document(id, foreign),
        Err(ApplicationServiceError::Upload(UploadRejected::NotOwner))
    ));

    let mut empty = upload(ENROLLMENT);
    empty.file.size_bytes = 0;
    assert!(matches!(
        service.upload_document(id, empty),
        Err(ApplicationServiceError::Upload(UploadRejected::EmptyFile))
    ));

    let mut oversized = upload(ENROLLMENT);
    oversized.file.size_bytes = 6 * 1024 * 1024;
    assert!(matches!(
        service.upload_document(id, oversized),
        Err(ApplicationServiceError::Upload(UploadRejected::TooLarge { .. }))
    ));

    let mut nameless = upload(ENROLLMENT);
    nameless.file.file_name = " ".to_string();
    assert!(matches!(
        service.upload_document(id, nameless),
        Err(ApplicationServiceError::Upload(UploadRejected::MissingFile))
    ));

    assert!(matches!(
        service.upload_document(id, upload(DocumentTypeId(77))),
        Err(ApplicationServiceError::Upload(
            UploadRejected::UnknownDocumentType(DocumentTypeId(77))
        ))
    ));

    assert!(documents.stored().is_empty());
}

#[test]
fn reupload_replaces_the_previous_document() {
    let (service, _, documents, _) = build_service();
    let record = service.create_draft(draft()).expect("draft is valid");
    let id = &record.application_id;

    let first = service
        .upload_document(id, upload(INCOME_TAX_RETURN))
        .expect("upload accepted");
    service
        .verify_document(
            first.id,
            VerificationDecision {
                status: VerificationStatus::Rejected,
                remarks: Some("blurry scan".to_string()),
            },
        )
        .expect("verification recorded");

    let mut retry = upload(INCOME_TAX_RETURN);
    retry.file = file("itr-rescan.pdf");
    let second = service.upload_document(id, retry).expect("re-upload accepted");

    assert_eq!(second.id, first.id);
    assert_eq!(second.status, VerificationStatus::Pending);
    assert_eq!(second.verified_at, None);
    assert_eq!(second.remarks, None);
    assert_eq!(second.file.file_name, "itr-rescan.pdf");
    assert_eq!(documents.stored().len(), 1);
}

#[test]
fn checklist_reports_progress_and_gate() {
    let (service, _, _, _) = build_service();
    let record = service.create_draft(draft()).expect("draft is valid");
    service
        .upload_document(&record.application_id, upload(ENROLLMENT))
        .expect("upload accepted");

    let checklist = service
        .checklist(&record.application_id)
        .expect("checklist builds");

    assert_eq!(checklist.items.len(), 4);
    assert_eq!(checklist.metrics.percentage, 33);
    assert!(!checklist.can_submit);
    assert!(checklist
        .blocked_reason
        .as_deref()
        .unwrap_or_default()
        .contains("Income Tax Return"));
    assert_eq!(checklist.progress.stage_index, 0);
}

#[test]
fn submit_requires_every_required_document() {
    let (service, repository, _, notices) = build_service();
    let record = service.create_draft(draft()).expect("draft is valid");
    service
        .upload_document(&record.application_id, upload(ENROLLMENT))
        .expect("upload accepted");

    match service.submit(&record.application_id) {
        Err(ApplicationServiceError::Submission(SubmissionBlocked::MissingDocuments {
            outstanding,
        })) => assert_eq!(outstanding.len(), 2),
        other => panic!("expected missing documents, got {other:?}"),
    }

    let stored = repository
        .fetch(&record.application_id)
        .expect("fetch succeeds")
        .expect("record present");
    assert_eq!(stored.status, ApplicationStatus::Draft);
    assert!(notices.events().is_empty());
}

#[test]
fn submit_stamps_record_and_notifies_student() {
    let (service, _, _, notices) = build_service();
    let record = ready_draft(&service);

    let submitted = service.submit(&record.application_id).expect("complete draft");

    assert_eq!(submitted.status, ApplicationStatus::Submitted);
    assert!(submitted.submitted_at.is_some());
    let events = notices.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].template, "application_submitted");
    assert_eq!(events[0].student_id, student());

    let checklist = service
        .checklist(&record.application_id)
        .expect("checklist builds");
    assert!(!checklist.can_submit);
    assert_eq!(checklist.metrics.percentage, 100);

    match service.submit(&record.application_id) {
        Err(ApplicationServiceError::Submission(SubmissionBlocked::NotDraft { .. })) => {}
        other => panic!("expected not draft, got {other:?}"),
    }
}

#[test]
fn uploads_are_locked_after_submission_and_reopen_on_hold() {
    let (service, _, _, _) = build_service();
    let record = ready_draft(&service);
    let id = &record.application_id;
    service.submit(id).expect("complete draft");

    assert!(matches!(
        service.upload_document(id, upload(RECOMMENDATION)),
        Err(ApplicationServiceError::Upload(UploadRejected::Locked(
            ApplicationStatus::Submitted
        )))
    ));

    advance_to(&service, id, ApplicationStatus::OnHold);
    service
        .upload_document(id, upload(RECOMMENDATION))
        .expect("on hold accepts uploads");
}

#[test]
fn advance_walks_the_pipeline_and_publishes_notices() {
    let (service, repository, _, notices) = build_service();
    let record = ready_draft(&service);
    let id = &record.application_id;
    service.submit(id).expect("complete draft");

    advance_to(&service, id, ApplicationStatus::Reviewed);
    let approved = service
        .advance(
            id,
            StatusChange {
                status: ApplicationStatus::Approved,
                approved_amount: Some(20_000),
                remarks: Some("  Partial grant  ".to_string()),
            },
        )
        .expect("approval allowed");
    assert_eq!(approved.approved_amount, Some(20_000));
    assert_eq!(approved.remarks.as_deref(), Some("Partial grant"));

    advance_to(&service, id, ApplicationStatus::Processing);
    advance_to(&service, id, ApplicationStatus::Released);

    let stored = repository
        .fetch(id)
        .expect("fetch succeeds")
        .expect("record present");
    assert_eq!(stored.status, ApplicationStatus::Released);
    assert!(stored.reviewed_at.is_some());
    assert!(stored.approved_at.is_some());
    assert_eq!(stored.status_view().progress.percent, 100);

    assert_eq!(
        notices.templates(),
        vec![
            "application_submitted",
            "application_reviewed",
            "application_approved",
            "application_processing",
            "application_released",
        ]
    );
}

#[test]
fn advance_rejects_backward_moves() {
    let (service, _, _, notices) = build_service();
    let record = ready_draft(&service);
    let id = &record.application_id;
    service.submit(id).expect("complete draft");
    advance_to(&service, id, ApplicationStatus::Approved);

    let result = service.advance(
        id,
        StatusChange {
            status: ApplicationStatus::Reviewed,
            approved_amount: None,
            remarks: None,
        },
    );

    match result {
        Err(ApplicationServiceError::Transition(TransitionError::NotAllowed { from, to })) => {
            assert_eq!(from, ApplicationStatus::Approved);
            assert_eq!(to, ApplicationStatus::Reviewed);
        }
        other => panic!("expected invalid transition, got {other:?}"),
    }
    assert_eq!(notices.events().len(), 2);
}

#[test]
fn held_application_cannot_resume_behind_its_stage() {
    let (service, repository, _, _) = build_service();
    let record = ready_draft(&service);
    let id = &record.application_id;
    service.submit(id).expect("complete draft");
    for status in [
        ApplicationStatus::Reviewed,
        ApplicationStatus::Approved,
        ApplicationStatus::Processing,
        ApplicationStatus::OnHold,
    ] {
        advance_to(&service, id, status);
    }

    let result = service.advance(
        id,
        StatusChange {
            status: ApplicationStatus::Submitted,
            approved_amount: None,
            remarks: None,
        },
    );
    match result {
        Err(ApplicationServiceError::Transition(TransitionError::ResumeBehind { held, to })) => {
            assert_eq!(held, ApplicationStatus::Processing);
            assert_eq!(to, ApplicationStatus::Submitted);
        }
        other => panic!("expected resume to be refused, got {other:?}"),
    }

    let stored = repository
        .fetch(id)
        .expect("fetch succeeds")
        .expect("record exists");
    assert_eq!(stored.status, ApplicationStatus::OnHold);
    assert_eq!(stored.status_view().progress.stage_index, 4);

    advance_to(&service, id, ApplicationStatus::Processing);
    advance_to(&service, id, ApplicationStatus::Released);
}

#[test]
fn notice_failures_do_not_undo_committed_changes() {
    let applications = Arc::new(MemoryApplications::default());
    let service = ScholarshipApplicationService::new(
        applications.clone(),
        Arc::new(MemoryDocuments::with_types(document_types())),
        Arc::new(FailingNotices),
        &portal_config(),
    );
    let record = service.create_draft(draft()).expect("draft is valid");
    let id = &record.application_id;
    let mut residency = None;
    for document_type_id in [ENROLLMENT, INCOME_TAX_RETURN, RESIDENCY] {
        residency = Some(
            service
                .upload_document(id, upload(document_type_id))
                .expect("upload accepted"),
        );
    }

    let submitted = service.submit(id).expect("submission is committed");
    assert_eq!(submitted.status, ApplicationStatus::Submitted);
    assert!(matches!(
        service.submit(id),
        Err(ApplicationServiceError::Submission(SubmissionBlocked::NotDraft { .. }))
    ));

    let reviewed = service
        .advance(
            id,
            StatusChange {
                status: ApplicationStatus::Reviewed,
                approved_amount: None,
                remarks: None,
            },
        )
        .expect("transition is committed");
    assert_eq!(reviewed.status, ApplicationStatus::Reviewed);

    let document = residency.expect("uploaded");
    let rejected = service
        .verify_document(
            document.id,
            VerificationDecision {
                status: VerificationStatus::Rejected,
                remarks: None,
            },
        )
        .expect("verification is committed");
    assert_eq!(rejected.status, VerificationStatus::Rejected);

    let stored = applications
        .fetch(id)
        .expect("fetch succeeds")
        .expect("record exists");
    assert_eq!(stored.status, ApplicationStatus::Reviewed);
}

#[test]
fn verify_rejection_notifies_the_student() {
    let (service, _, _, notices) = build_service();
    let record = service.create_draft(draft()).expect("draft is valid");
    let document = service
        .upload_document(&record.application_id, upload(RESIDENCY))
        .expect("upload accepted");

    let rejected = service
        .verify_document(
            document.id,
            VerificationDecision {
                status: VerificationStatus::Rejected,
                remarks: Some("expired certificate".to_string()),
            },
        )
        .expect("verification recorded");

    assert_eq!(rejected.status, VerificationStatus::Rejected);
    assert!(rejected.verified_at.is_some());
    let events = notices.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].template, "document_rejected");
    assert_eq!(
        events[0].details.get("remarks").map(String::as_str),
        Some("expired certificate")
    );
}

#[test]
fn verify_rejects_missing_decisions_and_unknown_documents() {
    let (service, _, _, _) = build_service();

    assert!(matches!(
        service.verify_document(
            DocumentId(1),
            VerificationDecision {
                status: VerificationStatus::Missing,
                remarks: None,
            },
        ),
        Err(ApplicationServiceError::Upload(
            UploadRejected::InvalidVerification
        ))
    ));

    assert!(matches!(
        service.verify_document(
            DocumentId(u64::MAX),
            VerificationDecision {
                status: VerificationStatus::Verified,
                remarks: None,
            },
        ),
        Err(ApplicationServiceError::Repository(RepositoryError::NotFound))
    ));
}

#[test]
fn repository_outages_surface_as_errors() {
    let service = service_with(UnavailableRepository);

    match service.create_draft(draft()) {
        Err(ApplicationServiceError::Repository(RepositoryError::Unavailable(message))) => {
            assert!(message.contains("offline"));
        }
        other => panic!("expected unavailable repository, got {other:?}"),
    }
}
