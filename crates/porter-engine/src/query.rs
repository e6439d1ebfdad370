//! Fluent filter/sort layer over the task registry.

use std::sync::Arc;

use strum::{Display, EnumString};

use porter_core::{TaskStatus, TaskType};

use crate::pool::TaskPool;
use crate::task::Task;

/// Sort key for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum OrderKey {
    #[default]
    StartTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum OrderDirection {
    Asc,
    #[default]
    Desc,
}

/// Accumulates filters over a pool's task list.
///
/// Filters narrow sequentially: kind, then status, then a stable sort
/// by start time (descending unless asked otherwise), then the owner
/// filter. The owner filter is applied whenever [`in_user`] was called,
/// even with an empty name; an empty name matches only unowned tasks.
///
/// [`in_user`]: TaskQueryBuilder::in_user
pub struct TaskQueryBuilder<'a> {
    pool: &'a TaskPool,
    types: Vec<TaskType>,
    statuses: Vec<TaskStatus>,
    order_key: OrderKey,
    direction: OrderDirection,
    in_user: Option<String>,
}

impl<'a> TaskQueryBuilder<'a> {
    pub(crate) fn new(pool: &'a TaskPool) -> Self {
        Self {
            pool,
            types: Vec::new(),
            statuses: Vec::new(),
            order_key: OrderKey::default(),
            direction: OrderDirection::default(),
            in_user: None,
        }
    }

    /// Keep tasks whose kind matches any of `types`. No call, or an
    /// empty list, keeps all kinds.
    pub fn with_types(mut self, types: impl IntoIterator<Item = TaskType>) -> Self {
        self.types.extend(types);
        self
    }

    /// Keep tasks whose status matches any of `statuses`. No call, or
    /// an empty list, keeps all statuses.
    pub fn with_status(mut self, statuses: impl IntoIterator<Item = TaskStatus>) -> Self {
        self.statuses.extend(statuses);
        self
    }

    pub fn with_order(mut self, key: OrderKey, direction: OrderDirection) -> Self {
        self.order_key = key;
        self.direction = direction;
        self
    }

    /// Keep only tasks owned by exactly `username`. An empty string
    /// matches only tasks created without an owner.
    pub fn in_user(mut self, username: impl Into<String>) -> Self {
        self.in_user = Some(username.into());
        self
    }

    /// Run the accumulated filters against the pool.
    ///
    /// The owner filter only applies when [`in_user`] was called: a
    /// builder that never names an owner matches every owner, rather
    /// than treating the absent name as an empty one. Callers wanting
    /// the restrictive empty-owner match must pass `in_user("")`
    /// explicitly.
    ///
    /// [`in_user`]: TaskQueryBuilder::in_user
    pub async fn query(self) -> Vec<Arc<Task>> {
        let mut tasks = self.pool.snapshot().await;

        if !self.types.is_empty() {
            tasks.retain(|task| self.types.contains(&task.kind()));
        }

        if !self.statuses.is_empty() {
            let mut kept = Vec::with_capacity(tasks.len());
            for task in tasks {
                if self.statuses.contains(&task.status().await) {
                    kept.push(task);
                }
            }
            tasks = kept;
        }

        match (self.order_key, self.direction) {
            (OrderKey::StartTime, OrderDirection::Asc) => {
                tasks.sort_by_key(|task| task.start_time());
            }
            (OrderKey::StartTime, OrderDirection::Desc) => {
                tasks.sort_by(|a, b| b.start_time().cmp(&a.start_time()));
            }
        }

        if let Some(username) = &self.in_user {
            tasks.retain(|task| task.username() == username.as_str());
        }

        tasks
    }
}
