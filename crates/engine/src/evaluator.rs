//! ComplianceEvaluator - per-person standing against effective rules
//!
//! Resolves the client's effective rules once per call, then classifies
//! each person's documents. Store failures surface as `DataUnavailable`;
//! nothing here falls back to "compliant". Unknown persons and clients are
//! `NotFound`.

use chrono::NaiveDate;
use futures::future::try_join_all;
use prereq_core::{
    document_status_rows, evaluate_documents, ComplianceResult, DocumentStatusRow,
    EffectiveRule, PartialComplianceEntry,
};

use crate::context::EngineContext;
use crate::error::EngineResult;
use crate::resolver::RuleResolver;

pub struct ComplianceEvaluator<'a> {
    ctx: &'a EngineContext,
}

impl<'a> ComplianceEvaluator<'a> {
    pub fn new(ctx: &'a EngineContext) -> Self {
        Self { ctx }
    }

    pub async fn evaluate(
        &self,
        person_id: &str,
        client_id: Option<&str>,
        today: NaiveDate,
    ) -> EngineResult<ComplianceResult> {
        self.ensure_person(person_id).await?;
        self.ensure_client(client_id).await?;
        let rules = RuleResolver::new(self.ctx)
            .resolve_effective_rules(client_id)
            .await?;
        self.evaluate_with_rules(person_id, client_id, &rules, today)
            .await
    }

    /// Unknown persons are `NotFound`, not "missing everything"
    async fn ensure_person(&self, person_id: &str) -> EngineResult<()> {
        self.ctx
            .fetch("get person", self.ctx.directory().get_person(person_id))
            .await
            .map(|_| ())
    }

    /// A named client must exist; its rules would otherwise read as global only
    async fn ensure_client(&self, client_id: Option<&str>) -> EngineResult<()> {
        let Some(client_id) = client_id else {
            return Ok(());
        };
        self.ctx
            .fetch("get client", self.ctx.directory().get_client(client_id))
            .await
            .map(|_| ())
    }

    async fn evaluate_with_rules(
        &self,
        person_id: &str,
        client_id: Option<&str>,
        rules: &[EffectiveRule],
        today: NaiveDate,
    ) -> EngineResult<ComplianceResult> {
        let documents = self
            .ctx
            .fetch("find documents", self.ctx.documents().find_by_person(person_id))
            .await?;

        let result = evaluate_documents(
            person_id,
            client_id,
            rules,
            &documents,
            self.ctx.calculator(),
            today,
        );

        tracing::debug!(
            person_id,
            client_id = client_id.unwrap_or("-"),
            status = %result.status,
            missing = result.missing.len(),
            expired = result.expired.len(),
            "compliance evaluated"
        );
        Ok(result)
    }

    /// Evaluate several persons concurrently; results follow input order.
    ///
    /// The first store failure fails the whole batch.
    pub async fn evaluate_many(
        &self,
        person_ids: &[String],
        client_id: Option<&str>,
        today: NaiveDate,
    ) -> EngineResult<Vec<ComplianceResult>> {
        self.ensure_client(client_id).await?;
        self.evaluate_batch(person_ids, client_id, today).await
    }

    async fn evaluate_batch(
        &self,
        person_ids: &[String],
        client_id: Option<&str>,
        today: NaiveDate,
    ) -> EngineResult<Vec<ComplianceResult>> {
        let rules = RuleResolver::new(self.ctx)
            .resolve_effective_rules(client_id)
            .await?;

        let evaluations = person_ids
            .iter()
            .map(|person_id| self.evaluate_with_rules(person_id, client_id, &rules, today));

        try_join_all(evaluations).await
    }

    /// Strict compliance table: every person assigned to the client (every
    /// person when `client_id` is `None`) with their status.
    pub async fn compliance_table(
        &self,
        client_id: Option<&str>,
        today: NaiveDate,
    ) -> EngineResult<Vec<ComplianceResult>> {
        self.ensure_client(client_id).await?;
        let persons = self
            .ctx
            .fetch("list persons", self.ctx.directory().list_persons(client_id))
            .await?;
        let person_ids: Vec<String> = persons.iter().map(|p| p.id()).collect();

        self.evaluate_batch(&person_ids, client_id, today).await
    }

    /// Persons who meet some but not all of the client's requirements
    pub async fn partial_compliance(
        &self,
        client_id: &str,
        today: NaiveDate,
    ) -> EngineResult<Vec<PartialComplianceEntry>> {
        let table = self.compliance_table(Some(client_id), today).await?;

        let partial: Vec<PartialComplianceEntry> = table
            .iter()
            .filter(|result| result.is_partial())
            .map(PartialComplianceEntry::from)
            .collect();

        tracing::debug!(
            client_id,
            evaluated = table.len(),
            partial = partial.len(),
            "partial compliance listed"
        );
        Ok(partial)
    }

    /// Every document of a person with its state under the effective rules
    pub async fn document_report(
        &self,
        person_id: &str,
        client_id: Option<&str>,
        today: NaiveDate,
    ) -> EngineResult<Vec<DocumentStatusRow>> {
        self.ensure_person(person_id).await?;
        self.ensure_client(client_id).await?;
        let rules = RuleResolver::new(self.ctx)
            .resolve_effective_rules(client_id)
            .await?;
        let documents = self
            .ctx
            .fetch("find documents", self.ctx.documents().find_by_person(person_id))
            .await?;

        Ok(document_status_rows(
            &rules,
            &documents,
            self.ctx.calculator(),
            today,
        ))
    }
}
