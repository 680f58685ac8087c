#![allow(dead_code)]

use docket_backend::config::{AppConfig, ObjectStoreConfig};
use docket_backend::error::ReconcileError;
use docket_backend::object_store::{MemoryObjectStore, ObjectStore};
use docket_backend::reconcile::Applied;
use docket_backend::services::workspaces::{create_workspace, load_workspace_view};
use docket_backend::state::AppState;
use docket_backend::store::{submissions, Database};
use docket_common::model::participant::Participant;
use docket_common::model::requirement::{RequirementSpec, TemplateFile};
use docket_common::model::submission::Submission;
use docket_common::requests::{
    CreateWorkspaceRequest, DesiredParticipant, DesiredRequirement, UpdateWorkspaceRequest,
};
use docket_common::responses::WorkspaceView;
use std::sync::Arc;

pub const OWNER: &str = "owner-1";
pub const FUTURE: &str = "2099-01-01T00:00:00Z";

pub struct Harness {
    pub db: Database,
    pub store: Arc<MemoryObjectStore>,
    pub state: AppState,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(AppConfig {
            object_store: ObjectStoreConfig::Memory,
            ..AppConfig::default()
        })
    }

    pub fn with_config(config: AppConfig) -> Self {
        Self::build(config, |memory| memory as Arc<dyn ObjectStore>)
    }

    /// Serves the engine through `wrap(memory)`; `store` still exposes the
    /// underlying memory store for assertions.
    pub fn with_store(wrap: impl FnOnce(Arc<MemoryObjectStore>) -> Arc<dyn ObjectStore>) -> Self {
        Self::build(
            AppConfig {
                object_store: ObjectStoreConfig::Memory,
                ..AppConfig::default()
            },
            wrap,
        )
    }

    fn build(
        config: AppConfig,
        wrap: impl FnOnce(Arc<MemoryObjectStore>) -> Arc<dyn ObjectStore>,
    ) -> Self {
        let db = Database::open_in_memory().expect("in-memory database");
        let store = Arc::new(MemoryObjectStore::new());
        let (state, _rx) = AppState::new(db.clone(), wrap(store.clone()), &config);
        Self { db, store, state }
    }

    pub async fn workspace(&self) -> String {
        create_workspace(
            &self.db,
            OWNER,
            CreateWorkspaceRequest {
                title: "Onboarding 2099".into(),
                description: None,
                deadline: FUTURE.into(),
            },
        )
        .await
        .expect("create workspace")
    }

    pub async fn apply(
        &self,
        workspace_id: &str,
        desired: UpdateWorkspaceRequest,
    ) -> Result<Applied, ReconcileError> {
        self.state.reconciler.apply(OWNER, workspace_id, desired).await
    }

    /// Applies and waits for every post-commit task to finish.
    pub async fn apply_settled(&self, workspace_id: &str, desired: UpdateWorkspaceRequest) -> Applied {
        let mut applied = self.apply(workspace_id, desired).await.expect("apply");
        for task in applied.background.drain(..) {
            task.await.expect("post-commit task");
        }
        applied
    }

    pub async fn view(&self, workspace_id: &str) -> WorkspaceView {
        load_workspace_view(&self.db, OWNER, workspace_id)
            .await
            .expect("workspace view")
    }

    pub async fn put_blob(&self, content_id: &str, bytes: &[u8]) {
        self.store.put(content_id, bytes.to_vec()).await.expect("put blob");
    }

    /// Uploads a blob and records it as a submission, as the upload path would.
    pub async fn submit(&self, participant_id: &str, requirement_id: &str, content_id: &str) {
        self.put_blob(content_id, b"scan").await;
        let submission = Submission {
            id: uuid::Uuid::new_v4().to_string(),
            participant_id: participant_id.to_string(),
            requirement_id: requirement_id.to_string(),
            content_id: content_id.to_string(),
            filename: "scan.pdf".into(),
            size: 4,
        };
        self.db
            .run(move |conn| submissions::insert(conn, &submission).map_err(ReconcileError::from))
            .await
            .expect("insert submission");
    }

    pub async fn submissions(&self, workspace_id: &str) -> Vec<Submission> {
        let id = workspace_id.to_string();
        self.db
            .run(move |conn| submissions::list_for_workspace(conn, &id).map_err(ReconcileError::from))
            .await
            .expect("list submissions")
    }
}

pub fn desired(
    participants: Vec<DesiredParticipant>,
    requirements: Vec<DesiredRequirement>,
) -> UpdateWorkspaceRequest {
    UpdateWorkspaceRequest {
        title: "Onboarding 2099".into(),
        description: Some("Paperwork for new hires".into()),
        participants,
        requirements,
        deadline: FUTURE.into(),
        reminder_config: None,
        force: false,
        reopen: false,
    }
}

pub fn person(name: &str, email: Option<&str>) -> DesiredParticipant {
    DesiredParticipant {
        name: name.into(),
        email: email.map(str::to_string),
        ..Default::default()
    }
}

pub fn known(participant: &Participant) -> DesiredParticipant {
    DesiredParticipant {
        id: Some(participant.id.clone()),
        name: participant.name.clone(),
        email: participant.email.clone(),
        phone: participant.phone.clone(),
        user_id: participant.user_id.clone(),
    }
}

pub fn template(content_id: &str) -> TemplateFile {
    TemplateFile {
        content_id: content_id.into(),
        display_name: format!("{}.pdf", content_id.rsplit('/').next().unwrap_or(content_id)),
    }
}

pub fn doc(title: &str, templates: Vec<TemplateFile>) -> DesiredRequirement {
    DesiredRequirement {
        id: None,
        title: title.into(),
        description: None,
        required: true,
        allow_multiple_files: false,
        templates,
    }
}

pub fn known_doc(requirement: &RequirementSpec) -> DesiredRequirement {
    DesiredRequirement {
        id: Some(requirement.id.clone()),
        title: requirement.title.clone(),
        description: requirement.description.clone(),
        required: requirement.required,
        allow_multiple_files: requirement.allow_multiple_files,
        templates: requirement.templates.clone(),
    }
}

pub fn by_name<'a>(view: &'a WorkspaceView, name: &str) -> &'a Participant {
    view.participants
        .iter()
        .find(|p| p.name == name)
        .unwrap_or_else(|| panic!("participant {name} missing"))
}

pub fn by_title<'a>(view: &'a WorkspaceView, title: &str) -> &'a RequirementSpec {
    view.requirements
        .iter()
        .find(|r| r.title == title)
        .unwrap_or_else(|| panic!("requirement {title} missing"))
}
