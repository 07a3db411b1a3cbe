use metrics_exporter_prometheus::PrometheusHandle;
use scholarship_portal::error::AppError;
use scholarship_portal::workflows::applications::{
    ApplicationId, ApplicationRecord, ApplicationRepository, DocumentId, DocumentRepository,
    NoticeError, NoticePublisher, RepositoryError, RequiredDocumentType, StatusNotice, StudentId,
    SubmittedDocument,
};
use scholarship_portal::workflows::catalog::{DocumentCatalog, DocumentCatalogImporter};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Built-in catalog unless a CSV path is given.
pub(crate) fn load_catalog(path: Option<&Path>) -> Result<DocumentCatalog, AppError> {
    match path {
        Some(path) => {
            let catalog = DocumentCatalogImporter::from_path(path)?;
            info!(path = %path.display(), document_types = catalog.len(), "document catalog imported");
            Ok(catalog)
        }
        None => Ok(DocumentCatalog::standard()),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable("in-memory store poisoned".to_string()))
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryApplicationRepository {
    records: Arc<Mutex<HashMap<ApplicationId, ApplicationRecord>>>,
}

impl ApplicationRepository for InMemoryApplicationRepository {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        let mut guard = lock(&self.records)?;
        if guard.contains_key(&record.application_id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.application_id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: ApplicationRecord) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.records)?;
        if guard.contains_key(&record.application_id) {
            guard.insert(record.application_id.clone(), record);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        let guard = lock(&self.records)?;
        Ok(guard.get(id).cloned())
    }

    fn list_for_student(
        &self,
        student_id: &StudentId,
    ) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        let guard = lock(&self.records)?;
        Ok(guard
            .values()
            .filter(|record| &record.student_id == student_id)
            .cloned()
            .collect())
    }
}

/// Catalog plus uploads, kept in upload order.
#[derive(Clone)]
pub(crate) struct InMemoryDocumentRepository {
    types: Arc<Vec<RequiredDocumentType>>,
    documents: Arc<Mutex<Vec<SubmittedDocument>>>,
}

impl InMemoryDocumentRepository {
    pub(crate) fn new(catalog: DocumentCatalog) -> Self {
        Self {
            types: Arc::new(catalog.into_types()),
            documents: Arc::default(),
        }
    }
}

impl DocumentRepository for InMemoryDocumentRepository {
    fn required_types(&self) -> Result<Vec<RequiredDocumentType>, RepositoryError> {
        Ok(self.types.as_ref().clone())
    }

    fn documents_for(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Vec<SubmittedDocument>, RepositoryError> {
        let guard = lock(&self.documents)?;
        Ok(guard
            .iter()
            .filter(|document| &document.application_id == application_id)
            .cloned()
            .collect())
    }

    fn fetch_document(&self, id: DocumentId) -> Result<Option<SubmittedDocument>, RepositoryError> {
        let guard = lock(&self.documents)?;
        Ok(guard.iter().find(|document| document.id == id).cloned())
    }

    fn insert_document(
        &self,
        document: SubmittedDocument,
    ) -> Result<SubmittedDocument, RepositoryError> {
        let mut guard = lock(&self.documents)?;
        if guard.iter().any(|existing| existing.id == document.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(document.clone());
        Ok(document)
    }

    fn update_document(&self, document: SubmittedDocument) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.documents)?;
        let slot = guard
            .iter_mut()
            .find(|existing| existing.id == document.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = document;
        Ok(())
    }
}

/// Stands in for the e-mail/SMS adapter: logs each notice and keeps it for inspection.
#[derive(Default, Clone)]
pub(crate) struct InMemoryNoticePublisher {
    events: Arc<Mutex<Vec<StatusNotice>>>,
}

impl NoticePublisher for InMemoryNoticePublisher {
    fn publish(&self, notice: StatusNotice) -> Result<(), NoticeError> {
        info!(
            template = %notice.template,
            application_id = %notice.application_id.0,
            student_id = %notice.student_id.0,
            "notice queued"
        );
        let mut guard = self
            .events
            .lock()
            .map_err(|_| NoticeError::Transport("notice queue poisoned".to_string()))?;
        guard.push(notice);
        Ok(())
    }
}

impl InMemoryNoticePublisher {
    pub(crate) fn events(&self) -> Vec<StatusNotice> {
        self.events
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}
