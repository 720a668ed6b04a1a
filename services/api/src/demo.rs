use crate::infra::{InMemoryNotifier, InMemoryPipelineRepository};
use chrono::{Local, NaiveDate};
use clap::Args;
use intern_hub::config::{OfferGate, PipelineConfig};
use intern_hub::error::AppError;
use intern_hub::workflows::hiring::{
    DocumentKind, DocumentUpload, HiringRound, HiringService, OfferRequest, OfferTerms,
    OutcomeSubmission, PipelineError, PipelineStage, PipelineView, RoundStatus, SessionContext,
    SessionRole, SignedArtifact, SubjectId, WorkMode,
};
use intern_hub::workflows::intake::{CandidateImporter, CandidateSubmission};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

type DemoService = HiringService<InMemoryPipelineRepository, InMemoryNotifier>;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Optional candidate CSV used instead of the built-in cohort
    #[arg(long)]
    pub(crate) candidates_csv: Option<PathBuf>,
    /// College recorded against imported candidates
    #[arg(long, default_value = "Riverside Institute of Technology")]
    pub(crate) college: String,
    /// Joining date for the selected intern (YYYY-MM-DD). Defaults to today + 30 days.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) join_date: Option<NaiveDate>,
    /// Generate the offer before documents are verified and only warn
    #[arg(long)]
    pub(crate) advisory_gate: bool,
    /// Print the final pipeline views as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct CandidateCsvArgs {
    /// College the uploaded candidates belong to
    #[arg(long)]
    pub(crate) college: String,
    /// CSV file with name, email, phone, branch and cgpa columns
    pub(crate) path: PathBuf,
}

pub(crate) fn run_candidate_validation(args: CandidateCsvArgs) -> Result<(), AppError> {
    let rows = CandidateImporter::from_path(&args.path, &args.college)?;
    let summary = CandidateImporter::dry_run(rows);

    println!("Candidate upload check: {}", args.path.display());
    println!(
        "  {} rows, {} valid, {} invalid",
        summary.total_rows, summary.success_count, summary.failure_count
    );
    for error in &summary.errors {
        println!("  - {error}");
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct DemoReport {
    pipelines: Vec<PipelineView>,
    notices: Vec<String>,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        candidates_csv,
        college,
        join_date,
        advisory_gate,
        json,
    } = args;

    let offer_gate = if advisory_gate {
        OfferGate::Advisory
    } else {
        OfferGate::Strict
    };
    let join_date =
        join_date.unwrap_or_else(|| Local::now().date_naive() + chrono::Duration::days(30));

    let notifier = Arc::new(InMemoryNotifier::default());
    let service = HiringService::new(
        Arc::new(InMemoryPipelineRepository::default()),
        notifier.clone(),
        PipelineConfig { offer_gate },
    );
    let recruiter = SessionContext::new("recruiter@intern-hub.local", SessionRole::Recruiter);
    let panel = SessionContext::new("panel@intern-hub.local", SessionRole::Interviewer);

    println!("Intern hub pipeline demo (offer gate: {offer_gate:?})");
    let cohort = register_cohort(&service, &recruiter, candidates_csv, &college)?;
    if cohort.len() < 3 {
        println!(
            "  Need at least three valid candidates to run the demo; found {}",
            cohort.len()
        );
        return Ok(());
    }

    println!("\nHiring rounds");
    let selected = &cohort[0];
    for (round, score) in [
        (HiringRound::AptitudeTest, 78),
        (HiringRound::TechnicalRound1, 84),
        (HiringRound::TechnicalRound2, 81),
        (HiringRound::HrRound, 88),
    ] {
        report_step(
            &format!("{selected} {round}"),
            service.submit_outcome(
                &panel,
                selected,
                OutcomeSubmission::new(round, RoundStatus::Cleared).with_score(score),
            ),
        );
    }

    let rejected = &cohort[1];
    report_step(
        &format!("{rejected} Aptitude Test"),
        service.submit_outcome(
            &panel,
            rejected,
            OutcomeSubmission::new(HiringRound::AptitudeTest, RoundStatus::Cleared),
        ),
    );
    report_step(
        &format!("{rejected} Technical Round 1"),
        service.submit_outcome(
            &panel,
            rejected,
            OutcomeSubmission::new(HiringRound::TechnicalRound1, RoundStatus::Rejected)
                .with_feedback("needs stronger fundamentals"),
        ),
    );
    report_step(
        &format!("{rejected} Technical Round 2 (expected to be locked)"),
        service.submit_outcome(
            &panel,
            rejected,
            OutcomeSubmission::new(HiringRound::TechnicalRound2, RoundStatus::Cleared),
        ),
    );

    let on_hold = &cohort[2];
    report_step(
        &format!("{on_hold} Aptitude Test"),
        service.submit_outcome(
            &panel,
            on_hold,
            OutcomeSubmission::new(HiringRound::AptitudeTest, RoundStatus::OnHold),
        ),
    );
    if let Some(leaving) = cohort.get(3) {
        report_step(
            &format!("{leaving} withdraws"),
            service.withdraw_candidate(&recruiter, leaving),
        );
    }

    println!("\nSelection");
    let mut selection = OutcomeSubmission::new(HiringRound::Selected, RoundStatus::Cleared);
    selection.join_date = Some(join_date);
    let intern_id = match service.submit_outcome(&recruiter, selected, selection) {
        Ok(receipt) => {
            println!(
                "  {} promoted to {} (joins {join_date})",
                selected,
                receipt.subject.id()
            );
            receipt.subject.id().clone()
        }
        Err(err) => {
            println!("  Promotion failed: {err}");
            return Ok(());
        }
    };

    println!("\nDocuments");
    for kind in DocumentKind::required() {
        let upload = DocumentUpload {
            kind,
            file_name: format!("{}.pdf", kind.label().to_lowercase().replace(' ', "-")),
            storage_key: format!("vault/{intern_id}/{kind:?}").to_lowercase(),
        };
        let document = match service.upload_document(&recruiter, &intern_id, upload) {
            Ok(document) => document,
            Err(err) => {
                println!("  Upload of {} failed: {err}", kind.label());
                continue;
            }
        };
        if kind == DocumentKind::Photo {
            report_step(
                "Passport Photo review",
                service.reject_document(&recruiter, &document.id, "background is not plain"),
            );
            if !advisory_gate {
                report_step(
                    "Passport Photo re-upload",
                    service.upload_document(
                        &recruiter,
                        &intern_id,
                        DocumentUpload {
                            kind,
                            file_name: "passport-photo-retake.jpg".to_string(),
                            storage_key: format!("vault/{intern_id}/photo-retake"),
                        },
                    ),
                );
                report_step(
                    "Passport Photo verification",
                    service.verify_document(&recruiter, &document.id),
                );
            }
            continue;
        }
        report_step(
            &format!("{} verification", kind.label()),
            service.verify_document(&recruiter, &document.id),
        );
    }
    if let Ok(checklist) = service.document_checklist(&recruiter, &intern_id) {
        println!(
            "  Checklist: {} verified, {} outstanding",
            checklist.verified.len(),
            checklist.outstanding().len()
        );
    }

    println!("\nOffer");
    let request = OfferRequest {
        terms: OfferTerms {
            position: "Software Engineering Intern".to_string(),
            department: "Platform Engineering".to_string(),
            stipend: 25_000,
            duration: "6 months".to_string(),
            start_date: join_date,
            location: "Pune".to_string(),
            reporting_manager: Some("Kavya Menon".to_string()),
            work_mode: WorkMode::Hybrid,
        },
        draft: false,
    };
    match service.generate_offer(&recruiter, &intern_id, request) {
        Ok(offer) => {
            println!("  Generated {} ({})", offer.id, offer.status);
            report_step("Send offer", service.send_offer(&recruiter, &offer.id));
            report_step(
                "Accept offer",
                service.accept_offer(
                    &recruiter,
                    &offer.id,
                    SignedArtifact {
                        file_name: "offer-letter-signed.pdf".to_string(),
                        storage_key: format!("vault/{intern_id}/offer-letter-signed.pdf"),
                    },
                ),
            );
        }
        Err(err) => println!("  Offer not generated: {err}"),
    }

    println!("\nPipeline summary");
    let mut pipelines = Vec::new();
    for id in cohort.iter().chain(std::iter::once(&intern_id)) {
        match service.pipeline(&recruiter, id) {
            Ok(view) => {
                println!(
                    "  {:<14} {:<10} {}",
                    id,
                    view.subject.kind_label(),
                    stage_label(&view.stage)
                );
                pipelines.push(view);
            }
            Err(err) => println!("  {id}: unavailable ({err})"),
        }
    }

    let notices: Vec<String> = notifier
        .notices()
        .into_iter()
        .map(|notice| format!("{} -> {}", notice.template, notice.subject_id))
        .collect();
    if notices.is_empty() {
        println!("\nNotifications: none dispatched");
    } else {
        println!("\nNotifications");
        for notice in &notices {
            println!("  - {notice}");
        }
    }

    if json {
        match serde_json::to_string_pretty(&DemoReport { pipelines, notices }) {
            Ok(payload) => println!("\n{payload}"),
            Err(err) => println!("\nJSON report unavailable: {err}"),
        }
    }

    Ok(())
}

fn register_cohort(
    service: &DemoService,
    session: &SessionContext,
    candidates_csv: Option<PathBuf>,
    college: &str,
) -> Result<Vec<SubjectId>, AppError> {
    if let Some(path) = candidates_csv {
        let file = std::fs::File::open(&path)?;
        return match service.import_candidates(session, college, file) {
            Ok(summary) => {
                println!(
                    "Imported {} of {} candidates from {}",
                    summary.success_count,
                    summary.total_rows,
                    path.display()
                );
                for error in &summary.errors {
                    println!("  - {error}");
                }
                Ok(summary.imported)
            }
            Err(PipelineError::Import(err)) => Err(err.into()),
            Err(err) => {
                println!("  Import failed: {err}");
                Ok(Vec::new())
            }
        };
    }

    let mut cohort = Vec::new();
    for submission in demo_cohort(college) {
        let email = submission.email.clone();
        match service.register_candidate(session, submission) {
            Ok(record) => {
                println!("Registered {} <{}> as {}", record.profile.name, email, record.id);
                cohort.push(record.id);
            }
            Err(err) => println!("  Registration of {email} failed: {err}"),
        }
    }
    Ok(cohort)
}

fn demo_cohort(college: &str) -> Vec<CandidateSubmission> {
    [
        ("Asha Rao", "asha.rao@example.com", "98765 00001", "Computer Science", "8.7"),
        ("Ravi Iyer", "ravi.iyer@example.com", "98765 00002", "Electronics", "7.4"),
        ("Meera Das", "meera.das@example.com", "98765 00003", "Information Technology", "8.1"),
    ]
    .into_iter()
    .map(|(name, email, phone, branch, cgpa)| CandidateSubmission {
        name: name.to_string(),
        email: email.to_string(),
        phone: phone.to_string(),
        emergency_contact: None,
        college_name: college.to_string(),
        branch: branch.to_string(),
        cgpa: cgpa.to_string(),
        graduation_year: Some(2026),
        address: None,
    })
    .collect()
}

fn report_step<T>(label: &str, result: Result<T, PipelineError>) {
    match result {
        Ok(_) => println!("  {label}: ok"),
        Err(err) => println!("  {label}: refused ({err})"),
    }
}

fn stage_label(stage: &PipelineStage) -> String {
    match stage {
        PipelineStage::InProgress { round } => format!("in progress at {round}"),
        PipelineStage::Rejected { round } => format!("rejected at {round}"),
        PipelineStage::Completed => "all rounds cleared".to_string(),
    }
}
