use crate::infra::{
    load_catalog, InMemoryApplicationRepository, InMemoryDocumentRepository,
    InMemoryNoticePublisher,
};
use chrono::{DateTime, Utc};
use clap::Args;
use scholarship_portal::config::PortalConfig;
use scholarship_portal::error::AppError;
use scholarship_portal::workflows::applications::{
    AcademicInformation, ApplicationChecklist, ApplicationDraft, ApplicationProgress,
    ApplicationStatus, CategoryId, DocumentUpload, FileReference, FinancialInformation,
    RequiredDocumentType, ScholarshipApplicationService, StatusChange, StudentId, SubcategoryId,
    VerificationDecision, VerificationStatus,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

const PROGRESS_BAR_WIDTH: usize = 20;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Optional CSV catalog; defaults to the built-in document set.
    #[arg(long)]
    pub(crate) document_catalog: Option<PathBuf>,
    /// Amount the demo applicant requests.
    #[arg(long, default_value_t = 15_000)]
    pub(crate) requested_amount: u32,
    /// Household income range as picked on the form.
    #[arg(long, default_value = "10,001 - 20,000")]
    pub(crate) income_range: String,
    /// General average as entered on the form.
    #[arg(long, default_value = "89.5%")]
    pub(crate) general_average: String,
    /// Reject the first upload during verification and walk through the re-upload.
    #[arg(long)]
    pub(crate) reject_first_document: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct CatalogShowArgs {
    /// CSV catalog to inspect instead of the built-in set.
    #[arg(long)]
    pub(crate) path: Option<PathBuf>,
    /// Print JSON instead of a table.
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Debug, Serialize)]
struct CatalogListing<'a> {
    source: String,
    required: usize,
    optional: usize,
    document_types: &'a [RequiredDocumentType],
}

pub(crate) fn run_catalog_show(args: CatalogShowArgs) -> Result<(), AppError> {
    let source = args
        .path
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "built-in".to_string());
    let mut types = load_catalog(args.path.as_deref())?.into_types();
    types.sort_by_key(|document_type| (!document_type.required, document_type.priority));

    let required = types.iter().filter(|item| item.required).count();
    let listing = CatalogListing {
        source,
        required,
        optional: types.len() - required,
        document_types: &types,
    };

    if args.json {
        match serde_json::to_string_pretty(&listing) {
            Ok(json) => println!("{json}"),
            Err(err) => println!("Catalog payload unavailable: {err}"),
        }
        return Ok(());
    }

    println!(
        "Document catalog ({}): {} required, {} optional",
        listing.source, listing.required, listing.optional
    );
    for document_type in listing.document_types {
        println!(
            "  [{:>3}] {:<52} {:<15} {}",
            document_type.id.0,
            document_type.name,
            document_type.category.label(),
            if document_type.required {
                "required"
            } else {
                "optional"
            }
        );
    }

    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let catalog = load_catalog(args.document_catalog.as_deref())?;
    let required_types: Vec<RequiredDocumentType> = catalog.required().cloned().collect();
    let optional_type = catalog.types().iter().find(|item| !item.required).cloned();

    let notices = Arc::new(InMemoryNoticePublisher::default());
    let service = ScholarshipApplicationService::new(
        Arc::new(InMemoryApplicationRepository::default()),
        Arc::new(InMemoryDocumentRepository::new(catalog)),
        notices.clone(),
        &PortalConfig::default(),
    );

    println!("Scholarship portal demo");
    let record = service.create_draft(demo_draft(&args))?;
    let id = record.application_id.clone();
    println!(
        "- Draft {} created for {} ({} requested)",
        id.0, record.student_id.0, record.requested_amount
    );
    println!(
        "  Normalized profile: income ~{} / month | grade point {:.2}",
        record.profile.estimated_monthly_income, record.profile.grade_point
    );

    println!("\nDocument checklist");
    render_checklist(&service.checklist(&id)?);

    for document_type in &required_types {
        service.upload_document(&id, demo_upload(&record.student_id, document_type))?;
        let checklist = service.checklist(&id)?;
        println!(
            "  uploaded {:<52} {} {:>3}%",
            document_type.name,
            progress_bar(checklist.metrics.percentage),
            checklist.metrics.percentage
        );
    }
    if let Some(document_type) = &optional_type {
        service.upload_document(&id, demo_upload(&record.student_id, document_type))?;
        println!("  uploaded {} (optional)", document_type.name);
    }

    let checklist = service.checklist(&id)?;
    render_checklist(&checklist);

    if args.reject_first_document {
        if let Some(first) = checklist.items.iter().find_map(|item| item.document.clone()) {
            service.verify_document(
                first.id,
                VerificationDecision {
                    status: VerificationStatus::Rejected,
                    remarks: Some("Scan is unreadable".to_string()),
                },
            )?;
            let blocked = service.checklist(&id)?;
            println!(
                "\n- Reviewer rejected document {} -> can submit: {}",
                first.id,
                blocked.can_submit
            );
            if let Some(reason) = &blocked.blocked_reason {
                println!("  {reason}");
            }
            let retry = DocumentUpload {
                student_id: record.student_id.clone(),
                document_type_id: first.document_type_id,
                file: FileReference {
                    file_name: format!("rescan-{}", first.file.file_name),
                    ..first.file.clone()
                },
            };
            service.upload_document(&id, retry)?;
            println!("  Re-uploaded a clearer scan");
        }
    }

    let submitted = service.submit(&id)?;
    println!(
        "\n- Submitted at {}",
        format_timestamp(submitted.submitted_at)
    );

    for document in service.documents(&id)? {
        if document.status == VerificationStatus::Pending {
            service.verify_document(
                document.id,
                VerificationDecision {
                    status: VerificationStatus::Verified,
                    remarks: None,
                },
            )?;
        }
    }
    let verified = service.checklist(&id)?;
    println!(
        "  Verified {}/{} required documents",
        verified.metrics.verified_required, verified.metrics.required
    );

    println!("\nStatus pipeline");
    print_progress(&service.get(&id)?.status_view().progress);
    for status in [
        ApplicationStatus::Reviewed,
        ApplicationStatus::Approved,
        ApplicationStatus::Processing,
        ApplicationStatus::Released,
    ] {
        let approved_amount = (status == ApplicationStatus::Approved)
            .then(|| args.requested_amount.saturating_sub(args.requested_amount / 5).max(1));
        let record = service.advance(
            &id,
            StatusChange {
                status,
                approved_amount,
                remarks: None,
            },
        )?;
        print_progress(&record.status_view().progress);
    }

    let released = service.get(&id)?;
    match serde_json::to_string_pretty(&released.status_view()) {
        Ok(json) => println!("\nPublic status payload:\n{json}"),
        Err(err) => println!("\nPublic status payload unavailable: {err}"),
    }

    let events = notices.events();
    if events.is_empty() {
        println!("Notices: none dispatched");
    } else {
        println!("Notices:");
        for notice in events {
            println!("  - template={} -> {}", notice.template, notice.student_id.0);
        }
    }

    Ok(())
}

fn demo_draft(args: &DemoArgs) -> ApplicationDraft {
    ApplicationDraft {
        student_id: StudentId("stu-demo-0001".to_string()),
        category_id: CategoryId("academic-excellence".to_string()),
        subcategory_id: Some(SubcategoryId("college".to_string())),
        requested_amount: args.requested_amount,
        financial: FinancialInformation {
            household_income_range: args.income_range.clone(),
            household_size: 5,
            father_occupation: Some("Farmer".to_string()),
            mother_occupation: Some("Teacher".to_string()),
        },
        academic: AcademicInformation {
            school_name: "Central Philippine University".to_string(),
            program: "BS Nursing".to_string(),
            year_level: 2,
            general_average: args.general_average.clone(),
        },
    }
}

fn demo_upload(student_id: &StudentId, document_type: &RequiredDocumentType) -> DocumentUpload {
    let slug: String = document_type
        .name
        .to_ascii_lowercase()
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() { ch } else { '-' })
        .collect();

    DocumentUpload {
        student_id: student_id.clone(),
        document_type_id: document_type.id,
        file: FileReference {
            storage_key: format!("demo/{}/{slug}.pdf", student_id.0),
            file_name: format!("{slug}.pdf"),
            content_type: "application/pdf".to_string(),
            size_bytes: 96_000 + u64::from(document_type.id.0) * 1_024,
        },
    }
}

fn render_checklist(checklist: &ApplicationChecklist) {
    for item in &checklist.items {
        println!(
            "  [{}] {:<52} {}",
            if item.is_submitted() { "x" } else { " " },
            item.name,
            if item.required {
                item.status.label()
            } else {
                "optional"
            }
        );
    }
    println!(
        "  {} of {} required uploaded ({}%) | can submit: {}",
        checklist.metrics.submitted_required,
        checklist.metrics.required,
        checklist.metrics.percentage,
        checklist.can_submit
    );
}

fn print_progress(progress: &ApplicationProgress) {
    println!(
        "  {} {:>3}% stage {}/{} {}",
        progress_bar(progress.percent),
        progress.percent,
        progress.stage_index + 1,
        progress.total_stages,
        progress.stage_label
    );
}

fn progress_bar(percent: u8) -> String {
    let filled = usize::from(percent.min(100)) * PROGRESS_BAR_WIDTH / 100;
    format!(
        "[{}{}]",
        "#".repeat(filled),
        ".".repeat(PROGRESS_BAR_WIDTH - filled)
    )
}

fn format_timestamp(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|stamp| stamp.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| "-".to_string())
}
