use serde::{Deserialize, Serialize};
use tracing::debug;

// ============================================================================
// Task Records
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub text: String,
    pub completed: bool,
    pub planned_pomodoros: u32,
    #[serde(default)]
    pub completed_pomodoros: u32,
    pub created_at: i64,
}

/// Planned pomodoro input from a form field; anything unusable becomes 1.
pub fn parse_planned(input: &str) -> u32 {
    input.trim().parse::<u32>().ok().filter(|&n| n >= 1).unwrap_or(1)
}

// ============================================================================
// Task List Manager
// ============================================================================

/// Ordered task list. Order is user controlled; insertion order is the default.
#[derive(Debug, Clone, Default)]
pub struct TaskList {
    tasks: Vec<Task>,
    selected_task_id: Option<String>,
    hide_completed: bool,
}

impl TaskList {
    /// Stored tasks with a planned count below 1 are raised to 1.
    pub fn new(mut tasks: Vec<Task>) -> Self {
        for task in &mut tasks {
            task.planned_pomodoros = task.planned_pomodoros.max(1);
        }
        Self {
            tasks,
            selected_task_id: None,
            hide_completed: false,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn selected_task_id(&self) -> Option<&str> {
        self.selected_task_id.as_deref()
    }

    pub fn hide_completed(&self) -> bool {
        self.hide_completed
    }

    pub fn toggle_hide_completed(&mut self) {
        self.hide_completed = !self.hide_completed;
    }

    /// Tasks to render under the current filter. Never changes the stored order.
    pub fn visible(&self) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|t| !(self.hide_completed && t.completed))
            .collect()
    }

    /// (total, completed)
    pub fn counts(&self) -> (usize, usize) {
        let completed = self.tasks.iter().filter(|t| t.completed).count();
        (self.tasks.len(), completed)
    }

    pub fn add(&mut self, text: &str, planned: u32, now_ms: i64) -> Option<String> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let id = self.unique_id(now_ms);
        self.tasks.push(Task {
            id: id.clone(),
            text: text.into(),
            completed: false,
            planned_pomodoros: planned.max(1),
            completed_pomodoros: 0,
            created_at: now_ms,
        });
        debug!(%id, "task added");
        Some(id)
    }

    /// Returns the new completed flag, or `None` for an unknown id.
    pub fn toggle_complete(&mut self, id: &str) -> Option<bool> {
        let task = self.tasks.iter_mut().find(|t| t.id == id)?;
        task.completed = !task.completed;
        Some(task.completed)
    }

    pub fn delete(&mut self, id: &str) -> Option<Task> {
        let idx = self.tasks.iter().position(|t| t.id == id)?;
        if self.selected_task_id.as_deref() == Some(id) {
            self.selected_task_id = None;
        }
        Some(self.tasks.remove(idx))
    }

    /// Rebuilds the order from `ids`. Unknown and repeated ids are dropped; tasks
    /// not named keep their relative order after the named ones.
    pub fn reorder(&mut self, ids: &[String]) {
        let mut remaining = std::mem::take(&mut self.tasks);
        let mut ordered = Vec::with_capacity(remaining.len());

        for id in ids {
            if let Some(idx) = remaining.iter().position(|t| &t.id == id) {
                ordered.push(remaining.remove(idx));
            }
        }

        ordered.append(&mut remaining);
        self.tasks = ordered;
    }

    /// Swaps `id` with the previous visible task. Hidden tasks keep their slots.
    pub fn move_up(&mut self, id: &str) -> bool {
        self.move_visible(id, -1)
    }

    /// Swaps `id` with the next visible task. Hidden tasks keep their slots.
    pub fn move_down(&mut self, id: &str) -> bool {
        self.move_visible(id, 1)
    }

    pub fn select(&mut self, id: &str) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        self.selected_task_id = Some(id.into());
        true
    }

    pub fn clear_selection(&mut self) {
        self.selected_task_id = None;
    }

    /// Credits one completed work phase to the active task, if any.
    pub fn increment_active_pomodoro(&mut self) -> Option<&Task> {
        let id = self.selected_task_id.as_deref()?;
        let task = self.tasks.iter_mut().find(|t| t.id == id)?;
        task.completed_pomodoros += 1;
        Some(task)
    }

    fn move_visible(&mut self, id: &str, step: isize) -> bool {
        let mut visible: Vec<String> = self.visible().iter().map(|t| t.id.clone()).collect();
        let Some(idx) = visible.iter().position(|v| v == id) else {
            return false;
        };
        let Some(target) = idx.checked_add_signed(step).filter(|&t| t < visible.len()) else {
            return false;
        };
        visible.swap(idx, target);

        // Visible slots take the swapped order, hidden tasks stay where they are.
        let mut swapped = visible.into_iter();
        let ids: Vec<String> = self
            .tasks
            .iter()
            .map(|t| {
                if self.hide_completed && t.completed {
                    t.id.clone()
                } else {
                    swapped.next().unwrap_or_else(|| t.id.clone())
                }
            })
            .collect();
        self.reorder(&ids);
        true
    }

    fn unique_id(&self, now_ms: i64) -> String {
        let base = now_ms.to_string();
        if self.get(&base).is_none() {
            return base;
        }
        let mut n = 1;
        loop {
            let candidate = format!("{}-{}", base, n);
            if self.get(&candidate).is_none() {
                return candidate;
            }
            n += 1;
        }
    }
}
