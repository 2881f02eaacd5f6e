use std::sync::Arc;

use crate::{
    foundation::core::{PackId, SourceId, TemplateId},
    foundation::error::MockupResult,
    jobs::registry::{JobKey, JobKind, JobRegistry, JobSnapshot, JobStart},
    registry::{
        pack::{Pack, PackUpdate},
        source::TemplateSource,
        template::{Template, TemplateSpec},
    },
    store::artworks::{ArtworkStatus, SourceArtwork},
    workflow::approval::ApprovalWorkflow,
};

/// Result of editing a pack.
#[derive(Clone, Debug, serde::Serialize)]
pub struct PackUpdateOutcome {
    pub pack: Pack,
    /// Published artworks whose mockups the edit invalidated.
    pub affected_products: usize,
    /// The reapply run, when one was enqueued.
    pub job: Option<JobStart>,
}

/// Result of editing or deleting a template.
#[derive(Clone, Debug, serde::Serialize)]
pub struct TemplateChangeOutcome {
    /// The template after the edit, or as it was before deletion.
    pub template: Template,
    /// Published artworks holding mockups from a pack that contains the template.
    pub affected_products: usize,
    /// One reapply run per pack with affected artworks.
    pub jobs: Vec<JobStart>,
}

/// Launches bulk reconciliation runs on the tokio runtime.
#[derive(Clone)]
pub struct JobRunner {
    workflow: Arc<ApprovalWorkflow>,
    jobs: Arc<JobRegistry>,
}

/// Releases the slot if a run task unwinds before finishing on its own.
struct FinishOnDrop {
    jobs: Arc<JobRegistry>,
    key: JobKey,
    finished: bool,
}

impl Drop for FinishOnDrop {
    fn drop(&mut self) {
        if !self.finished {
            self.jobs.finish(self.key);
        }
    }
}

/// Items of one run and the template source they are recomposed from.
struct Plan {
    items: Vec<SourceId>,
    source: Option<TemplateSource>,
}

impl JobRunner {
    pub fn new(workflow: Arc<ApprovalWorkflow>, jobs: Arc<JobRegistry>) -> Self {
        Self { workflow, jobs }
    }

    pub fn jobs(&self) -> &Arc<JobRegistry> {
        &self.jobs
    }

    pub fn snapshot(&self, kind: JobKind, pack_id: Option<PackId>) -> JobSnapshot {
        self.jobs.snapshot(JobKey::new(kind, pack_id))
    }

    /// Recompose every approved artwork; with `pack_id`, only those whose mockups use it.
    pub async fn reapply_all(&self, pack_id: Option<PackId>) -> MockupResult<JobStart> {
        self.trigger(JobKey::new(JobKind::ReapplyAll, pack_id)).await
    }

    /// Compose the active templates onto published, approved artworks with no mockups.
    pub async fn apply_missing(&self) -> MockupResult<JobStart> {
        self.trigger(JobKey::new(JobKind::ApplyMissing, None)).await
    }

    /// Recompose the published artworks currently holding mockups from `pack_id`.
    pub async fn reapply_pack(&self, pack_id: PackId) -> MockupResult<JobStart> {
        self.trigger(JobKey::new(JobKind::ReapplyPack, Some(pack_id)))
            .await
    }

    /// Edit a pack and, when its output changed, enqueue a reapply over exactly the
    /// affected published artworks. Returns without waiting for the run.
    ///
    /// An edit landing while the pack's reapply is running queues a follow-up run, so
    /// artworks the current run already passed are recomposed again.
    #[tracing::instrument(skip(self, update))]
    pub async fn update_pack(&self, pack_id: PackId, update: PackUpdate) -> MockupResult<PackUpdateOutcome> {
        let (pack, invalidates) = self.workflow.registry().update_pack(pack_id, update).await?;
        if !invalidates {
            return Ok(PackUpdateOutcome {
                pack,
                affected_products: 0,
                job: None,
            });
        }

        let (affected_products, job) = self.invalidate_pack(pack_id).await?;
        tracing::info!(%pack_id, affected_products, "pack updated");
        Ok(PackUpdateOutcome {
            pack,
            affected_products,
            job,
        })
    }

    /// Edit a template's geometry, dropping its cached scene and reapplying every
    /// pack that contains it.
    #[tracing::instrument(skip(self, spec))]
    pub async fn update_template(&self, id: TemplateId, spec: &TemplateSpec) -> MockupResult<TemplateChangeOutcome> {
        let previous = self.workflow.registry().template(id).await?;
        let template = self.workflow.registry().update_template(id, spec).await?;
        let compositor = self.workflow.compositor();
        compositor.forget_scene(&previous.geometry.scene_ref);
        compositor.forget_scene(&template.geometry.scene_ref);

        if previous.geometry == template.geometry {
            return Ok(TemplateChangeOutcome {
                template,
                affected_products: 0,
                jobs: Vec::new(),
            });
        }
        let packs = self.workflow.registry().packs_containing(id).await;
        self.invalidate_packs(template, &packs).await
    }

    /// Delete a template and reapply every pack it was removed from.
    #[tracing::instrument(skip(self))]
    pub async fn delete_template(&self, id: TemplateId) -> MockupResult<TemplateChangeOutcome> {
        let (template, packs) = self.workflow.registry().delete_template(id).await?;
        self.workflow
            .compositor()
            .forget_scene(&template.geometry.scene_ref);
        self.invalidate_packs(template, &packs).await
    }

    async fn invalidate_packs(&self, template: Template, packs: &[PackId]) -> MockupResult<TemplateChangeOutcome> {
        let mut affected_products = 0;
        let mut jobs = Vec::new();
        for &pack_id in packs {
            let (affected, job) = self.invalidate_pack(pack_id).await?;
            affected_products += affected;
            jobs.extend(job);
        }
        tracing::info!(template_id = %template.id, packs = packs.len(), affected_products, "template change invalidated packs");
        Ok(TemplateChangeOutcome {
            template,
            affected_products,
            jobs,
        })
    }

    /// Enqueue a pack reapply when published artworks use the pack, queueing behind
    /// a run already in progress.
    async fn invalidate_pack(&self, pack_id: PackId) -> MockupResult<(usize, Option<JobStart>)> {
        let key = JobKey::new(JobKind::ReapplyPack, Some(pack_id));
        let plan = self.plan(key).await?;
        let affected = plan.items.len();
        if affected == 0 {
            return Ok((0, None));
        }
        let start = self.jobs.start_or_queue(key, affected);
        if start.started() {
            self.spawn_run(key, plan);
        } else {
            tracing::info!(%pack_id, "reapply already running, follow-up queued");
        }
        Ok((affected, Some(start)))
    }

    /// Start `key` unless it is already running, in which case its snapshot is returned.
    async fn trigger(&self, key: JobKey) -> MockupResult<JobStart> {
        if let Some(running) = self.already_running(key) {
            return Ok(running);
        }
        let plan = self.plan(key).await?;
        let start = self.jobs.try_start(key, plan.items.len());
        if start.started() {
            self.spawn_run(key, plan);
        }
        Ok(start)
    }

    fn already_running(&self, key: JobKey) -> Option<JobStart> {
        let snapshot = self.jobs.snapshot(key);
        snapshot.running.then_some(JobStart::AlreadyRunning(snapshot))
    }

    /// The artworks a run of `key` covers right now.
    async fn plan(&self, key: JobKey) -> MockupResult<Plan> {
        match (key.kind, key.pack_id) {
            (JobKind::ReapplyAll, pack_id) => {
                let mut items = self.approved().await?;
                if let Some(pack_id) = pack_id {
                    let using = self
                        .workflow
                        .mockups()
                        .sources_referencing_pack(pack_id)
                        .await?;
                    items.retain(|a| using.contains(&a.id));
                }
                Ok(Plan {
                    items: items.into_iter().map(|a| a.id).collect(),
                    source: pack_id.map(TemplateSource::Pack),
                })
            }
            (JobKind::ApplyMissing, _) => {
                let mut items = Vec::new();
                for artwork in self.approved().await? {
                    if self.is_published(&artwork).await?
                        && self.workflow.mockups().get(artwork.id).await?.is_empty()
                    {
                        items.push(artwork.id);
                    }
                }
                Ok(Plan {
                    items,
                    source: Some(TemplateSource::ActiveTemplates),
                })
            }
            (JobKind::ReapplyPack, Some(pack_id)) => Ok(Plan {
                items: self.affected_by_pack(pack_id).await?,
                source: Some(TemplateSource::Pack(pack_id)),
            }),
            (JobKind::ReapplyPack, None) => Ok(Plan {
                items: Vec::new(),
                source: None,
            }),
        }
    }

    async fn approved(&self) -> MockupResult<Vec<SourceArtwork>> {
        self.workflow
            .artworks()
            .list_by_status(ArtworkStatus::Approved)
            .await
    }

    async fn is_published(&self, artwork: &SourceArtwork) -> MockupResult<bool> {
        let Some(product_id) = artwork.product_id else {
            return Ok(false);
        };
        Ok(self
            .workflow
            .catalog()
            .listing_for(product_id)
            .await?
            .is_some_and(|l| l.published))
    }

    async fn affected_by_pack(&self, pack_id: PackId) -> MockupResult<Vec<SourceId>> {
        let using = self
            .workflow
            .mockups()
            .sources_referencing_pack(pack_id)
            .await?;
        let mut ids = Vec::new();
        for artwork in self.approved().await? {
            if using.contains(&artwork.id) && self.is_published(&artwork).await? {
                ids.push(artwork.id);
            }
        }
        Ok(ids)
    }

    /// Drive a claimed slot to completion, replanning for every queued rerun.
    fn spawn_run(&self, key: JobKey, plan: Plan) {
        tracing::info!(kind = ?key.kind, pack_id = ?key.pack_id, items = plan.items.len(), "job started");
        let runner = self.clone();
        let mut guard = FinishOnDrop {
            jobs: Arc::clone(&self.jobs),
            key,
            finished: false,
        };
        tokio::spawn(async move {
            let mut plan = plan;
            loop {
                runner.run_items(key, &plan).await;
                if !runner.jobs.finish_or_rerun(key) {
                    guard.finished = true;
                    break;
                }
                plan = match runner.plan(key).await {
                    Ok(next) => next,
                    Err(e) => {
                        tracing::warn!(kind = ?key.kind, error = %e, "could not plan queued rerun");
                        Plan {
                            items: Vec::new(),
                            source: None,
                        }
                    }
                };
                runner.jobs.set_total(key, plan.items.len());
                tracing::info!(kind = ?key.kind, pack_id = ?key.pack_id, items = plan.items.len(), "queued rerun started");
            }
            tracing::info!(kind = ?key.kind, pack_id = ?key.pack_id, "job finished");
            drop(guard);
        });
    }

    async fn run_items(&self, key: JobKey, plan: &Plan) {
        for &source_id in &plan.items {
            let result = match self.workflow.reapply(source_id, plan.source).await {
                Ok(outcome) => match outcome.sync.failure() {
                    Some(message) => Err(format!("sync: {message}")),
                    None => Ok(()),
                },
                Err(e) => Err(e.to_string()),
            };
            if let Err(message) = &result {
                tracing::warn!(kind = ?key.kind, %source_id, error = %message, "job item failed");
            }
            self.jobs.record(key, source_id, result);
        }
    }
}
