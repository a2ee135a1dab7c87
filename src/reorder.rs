//! Drag-and-drop ordering arithmetic

use crate::todo::{Todo, TodoId};

/// Compute the order of a list after `dragged` has been dropped onto `target`.
///
/// When the dragged item comes from above the target it lands right after it, otherwise it lands
/// right before it. This is the same rule that drives the visual feedback while dragging, so the
/// order sent to the server is the order the user saw.
///
/// The order is returned unchanged if either identifier is missing, or if they are the same.
pub fn drop_onto(order: &[TodoId], dragged: TodoId, target: TodoId) -> Vec<TodoId> {
    let mut result = order.to_vec();
    if dragged == target {
        return result;
    }

    let (dragged_index, target_index) = match (index_of(order, dragged), index_of(order, target)) {
        (Some(d), Some(t)) => (d, t),
        _ => {
            log::debug!("Ignoring a drop of {} onto {}: not in the same list", dragged, target);
            return result;
        },
    };

    let moved = result.remove(dragged_index);
    // Dragging down, removing `moved` shifted the target up by one, so `target_index` is right after it.
    // Dragging up, the target did not move, so `target_index` is right before it.
    result.insert(target_index, moved);
    result
}

/// Put the reordered `visible` ids back into the `full` order of their list.
///
/// The slots held by visible todos are filled with `visible`, in its order; hidden todos keep
/// their slots. Visible ids that `full` does not know about are appended.
pub fn merge_visible_order(full: &[TodoId], visible: &[TodoId]) -> Vec<TodoId> {
    let mut reordered = visible.iter();
    let mut result: Vec<TodoId> = full.iter()
        .map(|&id| match visible.contains(&id) {
            true => reordered.next().copied().unwrap_or(id),
            false => id,
        })
        .collect();

    for &id in visible {
        if result.contains(&id) == false {
            result.push(id);
        }
    }
    result
}

fn index_of(order: &[TodoId], id: TodoId) -> Option<usize> {
    order.iter().position(|&candidate| candidate == id)
}

/// Sort `todos` following `order` and give them contiguous positions, starting at 0.
///
/// Todos that `order` does not mention keep their relative order and are placed last.
pub fn apply_order(todos: &mut Vec<Todo>, order: &[TodoId]) {
    todos.sort_by_key(|todo| index_of(order, todo.id()).unwrap_or(usize::MAX));
    renumber(todos);
}

/// Give `todos` contiguous positions following their current order, starting at 0
pub fn renumber(todos: &mut [Todo]) {
    for (position, todo) in todos.iter_mut().enumerate() {
        todo.set_position(position as i32);
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::todo::TodoDraft;

    const A: TodoId = 1;
    const B: TodoId = 2;
    const C: TodoId = 3;
    const D: TodoId = 4;

    #[test]
    fn dragging_down_inserts_after_target() {
        assert_eq!(drop_onto(&[A, B, C], A, C), vec![B, C, A]);
        assert_eq!(drop_onto(&[A, B, C, D], A, B), vec![B, A, C, D]);
        assert_eq!(drop_onto(&[A, B, C, D], B, C), vec![A, C, B, D]);
    }

    #[test]
    fn dragging_up_inserts_before_target() {
        assert_eq!(drop_onto(&[A, B, C], C, A), vec![C, A, B]);
        assert_eq!(drop_onto(&[A, B, C, D], D, B), vec![A, D, B, C]);
        assert_eq!(drop_onto(&[A, B, C, D], C, B), vec![A, C, B, D]);
    }

    #[test]
    fn degenerate_drops_keep_the_order() {
        assert_eq!(drop_onto(&[A, B, C], B, B), vec![A, B, C]);
        assert_eq!(drop_onto(&[A, B, C], D, A), vec![A, B, C]);
        assert_eq!(drop_onto(&[A, B, C], A, D), vec![A, B, C]);
        assert!(drop_onto(&[], A, B).is_empty());
    }

    #[test]
    fn hidden_todos_keep_their_slots() {
        // B and D are hidden
        assert_eq!(merge_visible_order(&[A, B, C, D], &[C, A]), vec![C, B, A, D]);
        assert_eq!(merge_visible_order(&[A, B, C], &[A, C]), vec![A, B, C]);
        // Everything is visible
        assert_eq!(merge_visible_order(&[A, B, C], &[B, C, A]), vec![B, C, A]);
        // The full list has not seen D yet
        assert_eq!(merge_visible_order(&[A, B], &[D, A]), vec![D, B, A]);
    }

    #[test]
    fn positions_are_contiguous_after_reorder() {
        let mut todos: Vec<Todo> = [A, B, C, D].iter()
            .map(|&id| {
                let mut todo = Todo::from_draft(id, &TodoDraft::new(format!("todo {}", id)));
                todo.set_position(10 * id as i32);
                todo
            })
            .collect();

        apply_order(&mut todos, &[C, A, B]);
        let ids: Vec<TodoId> = todos.iter().map(|t| t.id()).collect();
        let positions: Vec<i32> = todos.iter().map(|t| t.position()).collect();
        assert_eq!(ids, vec![C, A, B, D]);
        assert_eq!(positions, vec![0, 1, 2, 3]);
    }
}
