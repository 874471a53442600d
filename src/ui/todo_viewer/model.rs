use crate::task::Task;
use crate::views::Filter;

/// Indices into `tasks` shown under `filter`, in sequence order.
pub fn visible_indices(tasks: &[Task], filter: Filter) -> Vec<usize> {
    tasks
        .iter()
        .enumerate()
        .filter(|(_, task)| filter.matches(task))
        .map(|(idx, _)| idx)
        .collect()
}

/// Keep the previously selected task when it is still visible, otherwise
/// stay at the same list position (clamped to the new length).
pub fn select_by_id(
    tasks: &[Task],
    visible: &[usize],
    previous_id: Option<&str>,
    previous_pos: usize,
) -> Option<usize> {
    if visible.is_empty() {
        return None;
    }
    if let Some(id) = previous_id {
        if let Some(index) = tasks.iter().position(|task| task.id == id) {
            if visible.contains(&index) {
                return Some(index);
            }
        }
    }
    let pos = previous_pos.min(visible.len() - 1);
    Some(visible[pos])
}

/// Position of `selected` within `visible`.
pub fn position_of(visible: &[usize], selected: Option<usize>) -> Option<usize> {
    let selected = selected?;
    visible.iter().position(|candidate| *candidate == selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::tests::task;

    fn tasks() -> Vec<Task> {
        vec![
            task("a", "one", false, 1),
            task("b", "two", true, 2),
            task("c", "three", false, 3),
        ]
    }

    #[test]
    fn visible_indices_follow_filter() {
        let tasks = tasks();
        assert_eq!(visible_indices(&tasks, Filter::All), vec![0, 1, 2]);
        assert_eq!(visible_indices(&tasks, Filter::Active), vec![0, 2]);
        assert_eq!(visible_indices(&tasks, Filter::Done), vec![1]);
    }

    #[test]
    fn select_keeps_visible_task() {
        let tasks = tasks();
        let visible = visible_indices(&tasks, Filter::All);
        assert_eq!(select_by_id(&tasks, &visible, Some("c"), 0), Some(2));
    }

    #[test]
    fn select_falls_back_to_position() {
        let tasks = tasks();
        let visible = visible_indices(&tasks, Filter::Active);
        assert_eq!(select_by_id(&tasks, &visible, Some("b"), 1), Some(2));
        assert_eq!(select_by_id(&tasks, &visible, Some("gone"), 9), Some(2));
        assert_eq!(select_by_id(&tasks, &[], Some("a"), 0), None);
    }

    #[test]
    fn position_of_selected() {
        assert_eq!(position_of(&[0, 2], Some(2)), Some(1));
        assert_eq!(position_of(&[0, 2], Some(1)), None);
        assert_eq!(position_of(&[0, 2], None), None);
    }
}
