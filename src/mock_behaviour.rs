//! This module provides ways to tweak a local [`Cache`](crate::cache::Cache), so that it can return errors on some tests

use std::error::Error;

use crate::error::AgendaError;

/// This stores some behaviour tweaks, that describe how a mocked instance will behave during a given test
///
/// So that a functions fails _n_ times after _m_ initial successes, set `(m, n)` for the suited parameter
#[derive(Default, Clone, Debug)]
pub struct MockBehaviour {
    /// If this is true, every action will be allowed
    pub is_suspended: bool,

    // Queries
    pub fetch_behaviour: (u32, u32),
    pub statistics_behaviour: (u32, u32),

    // Todo mutations
    pub create_behaviour: (u32, u32),
    pub update_behaviour: (u32, u32),
    pub toggle_behaviour: (u32, u32),
    pub delete_behaviour: (u32, u32),
    pub reorder_behaviour: (u32, u32),
    pub move_behaviour: (u32, u32),

    // Tags, both queries and mutations
    pub tags_behaviour: (u32, u32),
}

impl MockBehaviour {
    pub fn new() -> Self {
        Self::default()
    }

    /// All items will fail at once, for `n_fails` times
    pub fn fail_now(n_fails: u32) -> Self {
        Self {
            is_suspended: false,
            fetch_behaviour: (0, n_fails),
            statistics_behaviour: (0, n_fails),
            create_behaviour: (0, n_fails),
            update_behaviour: (0, n_fails),
            toggle_behaviour: (0, n_fails),
            delete_behaviour: (0, n_fails),
            reorder_behaviour: (0, n_fails),
            move_behaviour: (0, n_fails),
            tags_behaviour: (0, n_fails),
        }
    }

    /// Suspend this mock behaviour until you call `resume`
    pub fn suspend(&mut self) {
        self.is_suspended = true;
    }
    /// Make this behaviour active again
    pub fn resume(&mut self) {
        self.is_suspended = false;
    }

    pub fn can_fetch(&mut self) -> Result<(), Box<dyn Error>> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.fetch_behaviour, "fetch")
    }
    pub fn can_get_statistics(&mut self) -> Result<(), Box<dyn Error>> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.statistics_behaviour, "get_statistics")
    }
    pub fn can_create(&mut self) -> Result<(), Box<dyn Error>> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.create_behaviour, "create")
    }
    pub fn can_update(&mut self) -> Result<(), Box<dyn Error>> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.update_behaviour, "update")
    }
    pub fn can_toggle(&mut self) -> Result<(), Box<dyn Error>> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.toggle_behaviour, "toggle")
    }
    pub fn can_delete(&mut self) -> Result<(), Box<dyn Error>> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.delete_behaviour, "delete")
    }
    pub fn can_reorder(&mut self) -> Result<(), Box<dyn Error>> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.reorder_behaviour, "reorder")
    }
    pub fn can_move(&mut self) -> Result<(), Box<dyn Error>> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.move_behaviour, "move")
    }
    pub fn can_use_tags(&mut self) -> Result<(), Box<dyn Error>> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.tags_behaviour, "tags")
    }
}


/// Return Ok(()) in case the value is `(1+, _)` or `(_, 0)`, or return Err and decrement otherwise
fn decrement(value: &mut (u32, u32), descr: &str) -> Result<(), Box<dyn Error>> {
    let remaining_successes = value.0;
    let remaining_failures = value.1;

    if remaining_successes > 0 {
        value.0 -= 1;
        log::debug!("Mock behaviour: allowing a {} ({:?})", descr, value);
        Ok(())
    } else if remaining_failures > 0 {
        value.1 -= 1;
        log::debug!("Mock behaviour: failing a {} ({:?})", descr, value);
        Err(Box::new(AgendaError::Mocked(descr.to_string())))
    } else {
        log::debug!("Mock behaviour: allowing a {} ({:?})", descr, value);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_mock_behaviour() {
        let mut ok = MockBehaviour::new();
        for _ in 0..7 {
            assert!(ok.can_fetch().is_ok());
        }

        let mut now = MockBehaviour::fail_now(2);
        assert!(now.can_fetch().is_err());
        assert!(now.can_reorder().is_err());
        assert!(now.can_reorder().is_err());
        assert!(now.can_fetch().is_err());
        assert!(now.can_fetch().is_ok());
        assert!(now.can_fetch().is_ok());
        assert!(now.can_reorder().is_ok());

        let mut custom = MockBehaviour{
            fetch_behaviour: (0,1),
            toggle_behaviour: (1,3),
            ..MockBehaviour::default()
        };
        assert!(custom.can_fetch().is_err());
        assert!(custom.can_fetch().is_ok());
        assert!(custom.can_fetch().is_ok());
        assert!(custom.can_toggle().is_ok());
        assert!(custom.can_toggle().is_err());
        assert!(custom.can_toggle().is_err());
        assert!(custom.can_toggle().is_err());
        assert!(custom.can_toggle().is_ok());
        assert!(custom.can_move().is_ok());
    }

    #[test]
    fn suspended_behaviour_allows_everything() {
        let mut behaviour = MockBehaviour::fail_now(1);
        behaviour.suspend();
        assert!(behaviour.can_delete().is_ok());
        behaviour.resume();
        let err = behaviour.can_delete().unwrap_err();
        assert_eq!(err.to_string(), "mocked failure of delete");
        assert!(behaviour.can_delete().is_ok());
    }
}
