//! Journey Circle Aggregate - The step data store of a wizard session
//!
//! Everything the wizard collects for one service area lives here: brain
//! content, the service area itself, industries, problems, solutions, offers,
//! asset drafts and title suggestions. All modifications go through this
//! aggregate root so the structural invariants hold after every mutation:
//!
//! - at most `max_problems` problems
//! - at most one primary problem
//! - at most one solution per problem
//! - every solution, offer and draft points at an existing parent
//! - the service area never changes once the circle has been created

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::domain::entities::{
    merge_regenerated, AssetDraft, AssetTarget, BrainContentItem, BrainContentKind, CircleStatus,
    JourneyCircle, Offer, Problem, Solution, Suggestion, SuggestionScope,
};
use crate::domain::errors::{WorkflowError, WorkflowResult};
use crate::domain::value_objects::{
    AssetDraftId, BrainContentId, ClientId, IdSequence, IndustryId, OfferId, ProblemId,
    ServiceAreaId, SolutionId, WebAddress, WizardStep, WorkflowPosition,
};

/// Keys of the step-scoped data held by the aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepField {
    BrainContent,
    ServiceArea,
    ExistingAssets,
    Industries,
    PrimaryProblem,
    Problems,
    ProblemSuggestions,
    Solutions,
    Offers,
    AssetDrafts,
    PublishNotes,
}

/// A value of one step-scoped field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum StepValue {
    BrainContent(Vec<BrainContentItem>),
    ServiceArea(Option<ServiceAreaId>),
    ExistingAssets(Vec<String>),
    Industries(BTreeSet<IndustryId>),
    PrimaryProblem(Option<ProblemId>),
    Problems(Vec<Problem>),
    ProblemSuggestions(Vec<Suggestion>),
    Solutions(Vec<Solution>),
    Offers(Vec<Offer>),
    AssetDrafts(Vec<AssetDraft>),
    PublishNotes(String),
}

impl StepValue {
    pub fn field(&self) -> StepField {
        match self {
            StepValue::BrainContent(_) => StepField::BrainContent,
            StepValue::ServiceArea(_) => StepField::ServiceArea,
            StepValue::ExistingAssets(_) => StepField::ExistingAssets,
            StepValue::Industries(_) => StepField::Industries,
            StepValue::PrimaryProblem(_) => StepField::PrimaryProblem,
            StepValue::Problems(_) => StepField::Problems,
            StepValue::ProblemSuggestions(_) => StepField::ProblemSuggestions,
            StepValue::Solutions(_) => StepField::Solutions,
            StepValue::Offers(_) => StepField::Offers,
            StepValue::AssetDrafts(_) => StepField::AssetDrafts,
            StepValue::PublishNotes(_) => StepField::PublishNotes,
        }
    }
}

/// A new child entity, identified by its parent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChildRecord {
    BrainContent {
        content_kind: BrainContentKind,
        value: String,
    },
    Problem {
        title: String,
        #[serde(default)]
        description: String,
    },
    Solution {
        problem_id: ProblemId,
        title: String,
        #[serde(default)]
        description: String,
    },
    Offer {
        solution_id: SolutionId,
        title: String,
        url: String,
        #[serde(default)]
        description: String,
    },
    AssetDraft {
        target: AssetTarget,
        title: String,
    },
}

/// Reference to an existing child entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ChildRef {
    BrainContent(BrainContentId),
    Problem(ProblemId),
    Solution(SolutionId),
    Offer(OfferId),
    AssetDraft(AssetDraftId),
}

impl std::fmt::Display for ChildRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChildRef::BrainContent(id) => write!(f, "brain content {}", id),
            ChildRef::Problem(id) => write!(f, "problem {}", id),
            ChildRef::Solution(id) => write!(f, "solution {}", id),
            ChildRef::Offer(id) => write!(f, "offer {}", id),
            ChildRef::AssetDraft(id) => write!(f, "asset draft {}", id),
        }
    }
}

/// Persisted navigation state of the wizard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowCheckpoint {
    pub position: WorkflowPosition,
    pub highest_validated: Option<WizardStep>,
}

impl Default for WorkflowCheckpoint {
    fn default() -> Self {
        Self {
            position: WorkflowPosition::Step(WizardStep::FIRST),
            highest_validated: None,
        }
    }
}

fn default_max_problems() -> usize {
    5
}

/// The Journey Circle Aggregate Root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JourneyCircleAggregate {
    client_id: ClientId,
    /// Present once step 2 has been committed
    circle: Option<JourneyCircle>,
    service_area_id: Option<ServiceAreaId>,
    brain_content: Vec<BrainContentItem>,
    existing_assets: Vec<String>,
    industries: BTreeSet<IndustryId>,
    problems: BTreeMap<ProblemId, Problem>,
    solutions: BTreeMap<SolutionId, Solution>,
    offers: BTreeMap<OfferId, Offer>,
    drafts: BTreeMap<AssetDraftId, AssetDraft>,
    problem_suggestions: Vec<Suggestion>,
    solution_suggestions: BTreeMap<ProblemId, Vec<Suggestion>>,
    publish_notes: String,
    checkpoint: WorkflowCheckpoint,
    ids: IdSequence,
    #[serde(skip, default = "default_max_problems")]
    max_problems: usize,
}

impl JourneyCircleAggregate {
    /// Start an empty aggregate for a client
    pub fn new(client_id: ClientId, max_problems: usize) -> Self {
        Self {
            client_id,
            circle: None,
            service_area_id: None,
            brain_content: Vec::new(),
            existing_assets: Vec::new(),
            industries: BTreeSet::new(),
            problems: BTreeMap::new(),
            solutions: BTreeMap::new(),
            offers: BTreeMap::new(),
            drafts: BTreeMap::new(),
            problem_suggestions: Vec::new(),
            solution_suggestions: BTreeMap::new(),
            publish_notes: String::new(),
            checkpoint: WorkflowCheckpoint::default(),
            ids: IdSequence::default(),
            max_problems,
        }
    }

    /// Re-apply session limits and re-seed the id sequence after loading
    ///
    /// A stored circle may hold more problems than a lowered limit allows. It
    /// still loads; new problems are refused and step 6 reports the count
    /// until enough are removed.
    pub fn hydrated(mut self, max_problems: usize) -> Self {
        self.max_problems = max_problems;
        let ids: Vec<i64> = self
            .brain_content
            .iter()
            .map(|b| b.id.get())
            .chain(self.problems.keys().map(|id| id.get()))
            .chain(self.solutions.keys().map(|id| id.get()))
            .chain(self.offers.keys().map(|id| id.get()))
            .chain(self.drafts.keys().map(|id| id.get()))
            .collect();
        for id in ids {
            self.ids.observe(id);
        }
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    pub fn circle(&self) -> Option<&JourneyCircle> {
        self.circle.as_ref()
    }

    pub fn service_area_id(&self) -> Option<ServiceAreaId> {
        self.service_area_id
    }

    pub fn max_problems(&self) -> usize {
        self.max_problems
    }

    pub fn brain_content(&self) -> &[BrainContentItem] {
        &self.brain_content
    }

    pub fn industries(&self) -> &BTreeSet<IndustryId> {
        &self.industries
    }

    /// Problems ordered by position
    pub fn problems(&self) -> Vec<&Problem> {
        let mut problems: Vec<&Problem> = self.problems.values().collect();
        problems.sort_by_key(|p| p.position);
        problems
    }

    pub fn problem_count(&self) -> usize {
        self.problems.len()
    }

    pub fn primary_problem_id(&self) -> Option<ProblemId> {
        self.problems
            .values()
            .find(|p| p.is_primary)
            .map(|p| p.id)
    }

    pub fn solutions(&self) -> impl Iterator<Item = &Solution> {
        self.solutions.values()
    }

    pub fn solution_for(&self, problem_id: ProblemId) -> Option<&Solution> {
        self.solutions.values().find(|s| s.problem_id == problem_id)
    }

    pub fn offers(&self) -> impl Iterator<Item = &Offer> {
        self.offers.values()
    }

    pub fn offers_for(&self, solution_id: SolutionId) -> Vec<&Offer> {
        self.offers
            .values()
            .filter(|o| o.solution_id == solution_id)
            .collect()
    }

    pub fn drafts(&self) -> impl Iterator<Item = &AssetDraft> {
        self.drafts.values()
    }

    pub fn draft(&self, id: AssetDraftId) -> Option<&AssetDraft> {
        self.drafts.get(&id)
    }

    pub fn suggestions(&self, scope: SuggestionScope) -> &[Suggestion] {
        match scope {
            SuggestionScope::ProblemTitles => self.problem_suggestions.as_slice(),
            SuggestionScope::SolutionTitles(problem_id) => self
                .solution_suggestions
                .get(&problem_id)
                .map(Vec::as_slice)
                .unwrap_or(&[]),
        }
    }

    pub fn checkpoint(&self) -> WorkflowCheckpoint {
        self.checkpoint
    }

    pub(crate) fn set_checkpoint(&mut self, checkpoint: WorkflowCheckpoint) {
        self.checkpoint = checkpoint;
        if let Some(circle) = self.circle.as_mut() {
            circle.status = if checkpoint.position.is_complete() {
                CircleStatus::Complete
            } else {
                CircleStatus::Incomplete
            };
            circle.touch();
        }
    }

    pub fn contains(&self, child: ChildRef) -> bool {
        match child {
            ChildRef::BrainContent(id) => self.brain_content.iter().any(|b| b.id == id),
            ChildRef::Problem(id) => self.problems.contains_key(&id),
            ChildRef::Solution(id) => self.solutions.contains_key(&id),
            ChildRef::Offer(id) => self.offers.contains_key(&id),
            ChildRef::AssetDraft(id) => self.drafts.contains_key(&id),
        }
    }

    // ========================================================================
    // Step-scoped get / set
    // ========================================================================

    /// Read one step-scoped field
    pub fn get(&self, field: StepField) -> StepValue {
        match field {
            StepField::BrainContent => StepValue::BrainContent(self.brain_content.clone()),
            StepField::ServiceArea => StepValue::ServiceArea(self.service_area_id),
            StepField::ExistingAssets => StepValue::ExistingAssets(self.existing_assets.clone()),
            StepField::Industries => StepValue::Industries(self.industries.clone()),
            StepField::PrimaryProblem => StepValue::PrimaryProblem(self.primary_problem_id()),
            StepField::Problems => {
                StepValue::Problems(self.problems().into_iter().cloned().collect())
            }
            StepField::ProblemSuggestions => {
                StepValue::ProblemSuggestions(self.problem_suggestions.clone())
            }
            StepField::Solutions => StepValue::Solutions(self.solutions.values().cloned().collect()),
            StepField::Offers => StepValue::Offers(self.offers.values().cloned().collect()),
            StepField::AssetDrafts => StepValue::AssetDrafts(self.drafts.values().cloned().collect()),
            StepField::PublishNotes => StepValue::PublishNotes(self.publish_notes.clone()),
        }
    }

    /// Replace one scalar step-scoped field
    ///
    /// Collections of child entities are changed through `append_child` and
    /// `remove_child` only, so their parent links stay checked.
    pub fn set(&mut self, value: StepValue) -> WorkflowResult<()> {
        match value {
            StepValue::ServiceArea(service_area_id) => self.set_service_area(service_area_id),
            StepValue::ExistingAssets(assets) => {
                self.existing_assets = assets
                    .into_iter()
                    .map(|a| a.trim().to_string())
                    .filter(|a| !a.is_empty())
                    .collect();
                Ok(())
            }
            StepValue::Industries(industries) => {
                self.industries = industries;
                Ok(())
            }
            StepValue::PrimaryProblem(problem_id) => self.set_primary_problem(problem_id),
            StepValue::PublishNotes(notes) => {
                self.publish_notes = notes;
                Ok(())
            }
            other => Err(WorkflowError::integrity(format!(
                "{:?} is changed by appending or removing children",
                other.field()
            ))),
        }
    }

    fn set_service_area(&mut self, service_area_id: Option<ServiceAreaId>) -> WorkflowResult<()> {
        if let Some(circle) = &self.circle {
            if service_area_id != Some(circle.service_area_id) {
                return Err(WorkflowError::integrity(format!(
                    "journey circle {} is bound to service area {}",
                    circle.id, circle.service_area_id
                )));
            }
        }
        self.service_area_id = service_area_id;
        Ok(())
    }

    fn set_primary_problem(&mut self, problem_id: Option<ProblemId>) -> WorkflowResult<()> {
        if let Some(id) = problem_id {
            if !self.problems.contains_key(&id) {
                return Err(WorkflowError::integrity(format!("no problem with id {}", id)));
            }
        }
        for problem in self.problems.values_mut() {
            problem.is_primary = Some(problem.id) == problem_id;
        }
        Ok(())
    }

    /// Bind the aggregate to the circle record created at step 2
    pub fn attach_circle(&mut self, circle: JourneyCircle) -> WorkflowResult<()> {
        if let Some(existing) = &self.circle {
            return Err(WorkflowError::integrity(format!(
                "service area {} already has journey circle {}",
                existing.service_area_id, existing.id
            )));
        }
        if self.service_area_id != Some(circle.service_area_id) {
            return Err(WorkflowError::integrity(format!(
                "journey circle {} belongs to service area {}, not the selected one",
                circle.id, circle.service_area_id
            )));
        }
        if circle.client_id != self.client_id {
            return Err(WorkflowError::integrity(format!(
                "journey circle {} belongs to client {}",
                circle.id, circle.client_id
            )));
        }
        self.circle = Some(circle);
        Ok(())
    }

    // ========================================================================
    // Children
    // ========================================================================

    /// Add a child entity under its parent, assigning it a new id
    pub fn append_child(&mut self, record: ChildRecord) -> WorkflowResult<ChildRef> {
        match record {
            ChildRecord::BrainContent {
                content_kind,
                value,
            } => {
                let id = BrainContentId::new(self.ids.next());
                let item = BrainContentItem::new(id, content_kind, value).map_err(|msg| {
                    WorkflowError::invalid_input(WizardStep::BrainContent, "brain_content_format", msg)
                })?;
                self.brain_content.push(item);
                Ok(ChildRef::BrainContent(id))
            }
            ChildRecord::Problem { title, description } => {
                self.add_problem(title, description).map(ChildRef::Problem)
            }
            ChildRecord::Solution {
                problem_id,
                title,
                description,
            } => self
                .add_solution(problem_id, title, description)
                .map(ChildRef::Solution),
            ChildRecord::Offer {
                solution_id,
                title,
                url,
                description,
            } => {
                if !self.solutions.contains_key(&solution_id) {
                    return Err(WorkflowError::integrity(format!(
                        "no solution with id {}",
                        solution_id
                    )));
                }
                let title = required_title(WizardStep::Offers, "offer_title", &title)?;
                let url = WebAddress::parse(&url).map_err(|msg| {
                    WorkflowError::invalid_input(WizardStep::Offers, "offer_url", msg)
                })?;
                let id = OfferId::new(self.ids.next());
                let offer = Offer::new(id, solution_id, title, url).with_description(description);
                self.offers.insert(id, offer);
                Ok(ChildRef::Offer(id))
            }
            ChildRecord::AssetDraft { target, title } => {
                let exists = match target {
                    AssetTarget::Problem(id) => self.problems.contains_key(&id),
                    AssetTarget::Solution(id) => self.solutions.contains_key(&id),
                };
                if !exists {
                    return Err(WorkflowError::integrity(format!(
                        "asset target {:?} does not exist",
                        target
                    )));
                }
                let title = required_title(WizardStep::Assets, "asset_title", &title)?;
                let id = AssetDraftId::new(self.ids.next());
                self.drafts.insert(id, AssetDraft::new(id, target, title));
                Ok(ChildRef::AssetDraft(id))
            }
        }
    }

    fn add_problem(&mut self, title: String, description: String) -> WorkflowResult<ProblemId> {
        if self.problems.len() >= self.max_problems {
            return Err(WorkflowError::integrity(format!(
                "a journey circle holds at most {} problems",
                self.max_problems
            )));
        }
        let title = required_title(WizardStep::ProblemTitles, "problem_title", &title)?;
        let id = ProblemId::new(self.ids.next());
        let position = self.problems.len();
        let problem = Problem::new(id, title, position).with_description(description);
        self.problems.insert(id, problem);
        Ok(id)
    }

    fn add_solution(
        &mut self,
        problem_id: ProblemId,
        title: String,
        description: String,
    ) -> WorkflowResult<SolutionId> {
        if !self.problems.contains_key(&problem_id) {
            return Err(WorkflowError::integrity(format!("no problem with id {}", problem_id)));
        }
        if let Some(existing) = self.solution_for(problem_id) {
            return Err(WorkflowError::integrity(format!(
                "problem {} already has solution {}",
                problem_id, existing.id
            )));
        }
        let title = required_title(WizardStep::Solutions, "solution_title", &title)?;
        let id = SolutionId::new(self.ids.next());
        let solution = Solution::new(id, problem_id, title).with_description(description);
        self.solutions.insert(id, solution);
        Ok(id)
    }

    /// Remove a child and everything that hangs off it
    ///
    /// Returns every removed entity, the requested one first.
    pub fn remove_child(&mut self, child: ChildRef) -> WorkflowResult<Vec<ChildRef>> {
        if !self.contains(child) {
            return Err(WorkflowError::integrity(format!("{} does not exist", child)));
        }
        let mut removed = vec![child];
        match child {
            ChildRef::BrainContent(id) => self.brain_content.retain(|b| b.id != id),
            ChildRef::Problem(id) => {
                if let Some(problem) = self.problems.remove(&id) {
                    if let Some(solution_id) = self.solution_for(id).map(|s| s.id) {
                        removed.extend(self.remove_solution(solution_id));
                    }
                    removed.extend(self.remove_drafts(|t| t == AssetTarget::Problem(id)));
                    self.solution_suggestions.remove(&id);
                    for suggestion in self.problem_suggestions.iter_mut() {
                        if suggestion.confirmed && suggestion.title == problem.title {
                            suggestion.confirmed = false;
                        }
                    }
                    self.compact_positions();
                }
            }
            ChildRef::Solution(id) => {
                // The solution itself is already recorded as `child`
                let cascaded = self.remove_solution(id);
                removed.extend(cascaded.into_iter().skip(1));
            }
            ChildRef::Offer(id) => {
                self.offers.remove(&id);
            }
            ChildRef::AssetDraft(id) => {
                self.drafts.remove(&id);
            }
        }
        Ok(removed)
    }

    fn remove_solution(&mut self, id: SolutionId) -> Vec<ChildRef> {
        let mut removed = Vec::new();
        let Some(solution) = self.solutions.remove(&id) else {
            return removed;
        };
        removed.push(ChildRef::Solution(id));

        let offer_ids: Vec<OfferId> = self
            .offers
            .values()
            .filter(|o| o.solution_id == id)
            .map(|o| o.id)
            .collect();
        for offer_id in offer_ids {
            self.offers.remove(&offer_id);
            removed.push(ChildRef::Offer(offer_id));
        }

        removed.extend(self.remove_drafts(|t| t == AssetTarget::Solution(id)));

        if let Some(suggestions) = self.solution_suggestions.get_mut(&solution.problem_id) {
            for suggestion in suggestions.iter_mut() {
                if suggestion.confirmed && suggestion.title == solution.title {
                    suggestion.confirmed = false;
                }
            }
        }
        removed
    }

    fn remove_drafts(&mut self, matches: impl Fn(AssetTarget) -> bool) -> Vec<ChildRef> {
        let ids: Vec<AssetDraftId> = self
            .drafts
            .values()
            .filter(|d| matches(d.target))
            .map(|d| d.id)
            .collect();
        for id in &ids {
            self.drafts.remove(id);
        }
        ids.into_iter().map(ChildRef::AssetDraft).collect()
    }

    fn compact_positions(&mut self) {
        let mut ordered: Vec<(usize, ProblemId)> =
            self.problems.values().map(|p| (p.position, p.id)).collect();
        ordered.sort();
        for (position, (_, id)) in ordered.into_iter().enumerate() {
            if let Some(problem) = self.problems.get_mut(&id) {
                problem.position = position;
            }
        }
    }

    /// Move a problem to a new position, shifting the others
    pub fn move_problem(&mut self, id: ProblemId, position: usize) -> WorkflowResult<()> {
        if !self.problems.contains_key(&id) {
            return Err(WorkflowError::integrity(format!("no problem with id {}", id)));
        }
        let mut order: Vec<ProblemId> = self.problems().into_iter().map(|p| p.id).collect();
        order.retain(|p| *p != id);
        let position = position.min(order.len());
        order.insert(position, id);
        for (index, problem_id) in order.into_iter().enumerate() {
            if let Some(problem) = self.problems.get_mut(&problem_id) {
                problem.position = index;
            }
        }
        Ok(())
    }

    // ========================================================================
    // Drafts and suggestions
    // ========================================================================

    pub fn draft_mut(&mut self, id: AssetDraftId) -> WorkflowResult<&mut AssetDraft> {
        self.drafts
            .get_mut(&id)
            .ok_or_else(|| WorkflowError::integrity(format!("no asset draft with id {}", id)))
    }

    pub(crate) fn restore_draft(&mut self, draft: AssetDraft) {
        self.drafts.insert(draft.id, draft);
    }

    /// Swap in regenerated titles, keeping confirmed suggestions
    pub fn replace_suggestions(
        &mut self,
        scope: SuggestionScope,
        titles: Vec<String>,
        limit: usize,
    ) -> WorkflowResult<()> {
        match scope {
            SuggestionScope::ProblemTitles => {
                self.problem_suggestions = merge_regenerated(&self.problem_suggestions, titles, limit);
            }
            SuggestionScope::SolutionTitles(problem_id) => {
                if !self.problems.contains_key(&problem_id) {
                    return Err(WorkflowError::integrity(format!(
                        "no problem with id {}",
                        problem_id
                    )));
                }
                let current = self
                    .solution_suggestions
                    .get(&problem_id)
                    .map(Vec::as_slice)
                    .unwrap_or(&[]);
                let merged = merge_regenerated(current, titles, limit);
                self.solution_suggestions.insert(problem_id, merged);
            }
        }
        Ok(())
    }

    /// Turn a suggestion into a problem or solution and mark it confirmed
    pub fn confirm_suggestion(&mut self, scope: SuggestionScope, index: usize) -> WorkflowResult<ChildRef> {
        let suggestion = self
            .suggestions(scope)
            .get(index)
            .cloned()
            .ok_or_else(|| {
                WorkflowError::integrity(format!("no suggestion at index {} for {:?}", index, scope))
            })?;
        if suggestion.confirmed {
            return Err(WorkflowError::integrity(format!(
                "suggestion '{}' is already confirmed",
                suggestion.title
            )));
        }

        let created = match scope {
            SuggestionScope::ProblemTitles => ChildRef::Problem(self.add_problem(suggestion.title, String::new())?),
            SuggestionScope::SolutionTitles(problem_id) => ChildRef::Solution(self.add_solution(
                problem_id,
                suggestion.title,
                String::new(),
            )?),
        };

        let list = match scope {
            SuggestionScope::ProblemTitles => &mut self.problem_suggestions,
            SuggestionScope::SolutionTitles(problem_id) => {
                self.solution_suggestions.entry(problem_id).or_default()
            }
        };
        if let Some(entry) = list.get_mut(index) {
            entry.confirmed = true;
        }
        Ok(created)
    }
}

fn required_title(step: WizardStep, rule: &'static str, title: &str) -> WorkflowResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(WorkflowError::invalid_input(step, rule, "title cannot be empty"));
    }
    Ok(title.to_string())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn aggregate() -> JourneyCircleAggregate {
        JourneyCircleAggregate::new(ClientId::new(1), 5)
    }

    pub(crate) fn problem(title: &str) -> ChildRecord {
        ChildRecord::Problem {
            title: title.to_string(),
            description: String::new(),
        }
    }

    pub(crate) fn solution(problem_id: ProblemId, title: &str) -> ChildRecord {
        ChildRecord::Solution {
            problem_id,
            title: title.to_string(),
            description: String::new(),
        }
    }

    pub(crate) fn offer(solution_id: SolutionId, title: &str) -> ChildRecord {
        ChildRecord::Offer {
            solution_id,
            title: title.to_string(),
            url: format!("https://example.com/{}", title.to_lowercase().replace(' ', "-")),
            description: String::new(),
        }
    }

    pub(crate) fn add_problem(agg: &mut JourneyCircleAggregate, title: &str) -> ProblemId {
        match agg.append_child(problem(title)).unwrap() {
            ChildRef::Problem(id) => id,
            other => panic!("expected a problem, got {:?}", other),
        }
    }

    pub(crate) fn add_solution(agg: &mut JourneyCircleAggregate, problem_id: ProblemId, title: &str) -> SolutionId {
        match agg.append_child(solution(problem_id, title)).unwrap() {
            ChildRef::Solution(id) => id,
            other => panic!("expected a solution, got {:?}", other),
        }
    }

    pub(crate) fn add_offer(agg: &mut JourneyCircleAggregate, solution_id: SolutionId, title: &str) -> OfferId {
        match agg.append_child(offer(solution_id, title)).unwrap() {
            ChildRef::Offer(id) => id,
            other => panic!("expected an offer, got {:?}", other),
        }
    }

    #[test]
    fn test_problem_limit_is_enforced_on_every_append() {
        let mut agg = aggregate();
        for i in 0..5 {
            add_problem(&mut agg, &format!("Problem {}", i));
        }
        let err = agg.append_child(problem("Sixth")).unwrap_err();
        assert!(matches!(err, WorkflowError::IntegrityViolation(_)));
        assert_eq!(agg.problem_count(), 5);
    }

    #[test]
    fn test_problem_positions_follow_insertion_and_compact_after_removal() {
        let mut agg = aggregate();
        let a = add_problem(&mut agg, "A");
        let b = add_problem(&mut agg, "B");
        let c = add_problem(&mut agg, "C");

        agg.remove_child(ChildRef::Problem(b)).unwrap();
        let problems = agg.problems();
        assert_eq!(problems.len(), 2);
        assert_eq!((problems[0].id, problems[0].position), (a, 0));
        assert_eq!((problems[1].id, problems[1].position), (c, 1));
    }

    #[test]
    fn test_removing_problem_cascades_to_solution_and_offers() {
        let mut agg = aggregate();
        let p1 = add_problem(&mut agg, "P1");
        let p2 = add_problem(&mut agg, "P2");
        let s1 = add_solution(&mut agg, p1, "S1");
        let s2 = add_solution(&mut agg, p2, "S2");
        let o1 = add_offer(&mut agg, s1, "O1");
        let o2 = add_offer(&mut agg, s1, "O2");
        let o3 = add_offer(&mut agg, s2, "O3");

        let removed = agg.remove_child(ChildRef::Problem(p1)).unwrap();
        assert_eq!(removed[0], ChildRef::Problem(p1));
        assert!(removed.contains(&ChildRef::Solution(s1)));
        assert!(removed.contains(&ChildRef::Offer(o1)));
        assert!(removed.contains(&ChildRef::Offer(o2)));

        assert!(agg.contains(ChildRef::Problem(p2)));
        assert!(agg.contains(ChildRef::Solution(s2)));
        assert!(agg.contains(ChildRef::Offer(o3)));
        assert_eq!(agg.offers().count(), 1);
    }

    #[test]
    fn test_removing_solution_keeps_problem() {
        let mut agg = aggregate();
        let p = add_problem(&mut agg, "P");
        let s = add_solution(&mut agg, p, "S");
        let o = add_offer(&mut agg, s, "O");

        let removed = agg.remove_child(ChildRef::Solution(s)).unwrap();
        assert_eq!(removed, vec![ChildRef::Solution(s), ChildRef::Offer(o)]);
        assert!(agg.contains(ChildRef::Problem(p)));
        assert!(agg.solution_for(p).is_none());
    }

    #[test]
    fn test_second_solution_for_problem_is_rejected() {
        let mut agg = aggregate();
        let p = add_problem(&mut agg, "P");
        add_solution(&mut agg, p, "First");
        let err = agg.append_child(solution(p, "Second")).unwrap_err();
        assert!(matches!(err, WorkflowError::IntegrityViolation(_)));
    }

    #[test]
    fn test_offer_requires_absolute_url() {
        let mut agg = aggregate();
        let p = add_problem(&mut agg, "P");
        let s = add_solution(&mut agg, p, "S");
        let err = agg
            .append_child(ChildRecord::Offer {
                solution_id: s,
                title: "Audit".to_string(),
                url: "/audit".to_string(),
                description: String::new(),
            })
            .unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::Validation { step: WizardStep::Offers, .. }
        ));
    }

    #[test]
    fn test_orphan_children_are_rejected() {
        let mut agg = aggregate();
        let err = agg
            .append_child(solution(ProblemId::new(99), "S"))
            .unwrap_err();
        assert!(matches!(err, WorkflowError::IntegrityViolation(_)));
        let err = agg
            .append_child(offer(SolutionId::new(99), "O"))
            .unwrap_err();
        assert!(matches!(err, WorkflowError::IntegrityViolation(_)));
    }

    #[test]
    fn test_primary_problem_is_exclusive() {
        let mut agg = aggregate();
        let a = add_problem(&mut agg, "A");
        let b = add_problem(&mut agg, "B");
        agg.set(StepValue::PrimaryProblem(Some(a))).unwrap();
        agg.set(StepValue::PrimaryProblem(Some(b))).unwrap();
        assert_eq!(agg.primary_problem_id(), Some(b));
        assert_eq!(agg.problems().iter().filter(|p| p.is_primary).count(), 1);

        agg.remove_child(ChildRef::Problem(b)).unwrap();
        assert_eq!(agg.primary_problem_id(), None);
        assert!(agg.set(StepValue::PrimaryProblem(Some(b))).is_err());
    }

    #[test]
    fn test_service_area_is_fixed_after_circle_creation() {
        let mut agg = aggregate();
        agg.set(StepValue::ServiceArea(Some(ServiceAreaId::new(3)))).unwrap();
        agg.set(StepValue::ServiceArea(Some(ServiceAreaId::new(4)))).unwrap();
        agg.attach_circle(JourneyCircle::new(
            crate::domain::value_objects::JourneyCircleId::new(10),
            ClientId::new(1),
            ServiceAreaId::new(4),
        ))
        .unwrap();

        let err = agg
            .set(StepValue::ServiceArea(Some(ServiceAreaId::new(3))))
            .unwrap_err();
        assert!(matches!(err, WorkflowError::IntegrityViolation(_)));
        assert_eq!(agg.service_area_id(), Some(ServiceAreaId::new(4)));
    }

    #[test]
    fn test_collections_cannot_be_set_wholesale() {
        let mut agg = aggregate();
        let err = agg.set(StepValue::Problems(Vec::new())).unwrap_err();
        assert!(matches!(err, WorkflowError::IntegrityViolation(_)));
    }

    #[test]
    fn test_confirming_suggestion_creates_problem() {
        let mut agg = aggregate();
        agg.replace_suggestions(
            SuggestionScope::ProblemTitles,
            vec!["Slow onboarding".to_string(), "High churn".to_string()],
            10,
        )
        .unwrap();

        let created = agg.confirm_suggestion(SuggestionScope::ProblemTitles, 1).unwrap();
        let ChildRef::Problem(id) = created else {
            panic!("expected a problem");
        };
        assert_eq!(agg.problems()[0].id, id);
        assert_eq!(agg.problems()[0].title, "High churn");
        assert!(agg.suggestions(SuggestionScope::ProblemTitles)[1].confirmed);
        assert!(agg.confirm_suggestion(SuggestionScope::ProblemTitles, 1).is_err());

        // Regenerating keeps the confirmed title and drops the other
        agg.replace_suggestions(
            SuggestionScope::ProblemTitles,
            vec!["Poor support".to_string()],
            10,
        )
        .unwrap();
        let titles: Vec<&str> = agg
            .suggestions(SuggestionScope::ProblemTitles)
            .iter()
            .map(|s| s.title.as_str())
            .collect();
        assert_eq!(titles, vec!["High churn", "Poor support"]);
    }

    #[test]
    fn test_hydration_reseeds_ids() {
        let mut agg = aggregate();
        add_problem(&mut agg, "A");
        add_problem(&mut agg, "B");
        let json = serde_json::to_string(&agg).unwrap();

        let restored: JourneyCircleAggregate = serde_json::from_str(&json).unwrap();
        let mut restored = restored.hydrated(5);
        let next = add_problem(&mut restored, "C");
        assert_eq!(next.get(), 3);
    }

    #[test]
    fn test_lowered_limit_keeps_stored_problems() {
        let mut agg = aggregate();
        let a = add_problem(&mut agg, "A");
        add_problem(&mut agg, "B");
        add_problem(&mut agg, "C");

        let mut shrunk = agg.hydrated(2);
        assert_eq!(shrunk.problem_count(), 3);
        let err = shrunk
            .append_child(ChildRecord::Problem {
                title: "D".to_string(),
                description: String::new(),
            })
            .unwrap_err();
        assert!(matches!(err, WorkflowError::IntegrityViolation(_)));

        shrunk.remove_child(ChildRef::Problem(a)).unwrap();
        assert_eq!(shrunk.problem_count(), 2);
    }

    #[test]
    fn test_move_problem_reorders_positions() {
        let mut agg = aggregate();
        let a = add_problem(&mut agg, "A");
        let b = add_problem(&mut agg, "B");
        let c = add_problem(&mut agg, "C");
        agg.move_problem(c, 0).unwrap();
        let order: Vec<ProblemId> = agg.problems().iter().map(|p| p.id).collect();
        assert_eq!(order, vec![c, a, b]);
    }
}
