//! Unit tests for abm-agent.

#[cfg(test)]
mod helpers {
    use std::sync::Mutex;

    use abm_core::{AgentId, Motion, Point};
    use abm_spatial::{PointSpace, TileGrid};

    use crate::{AgentHandle, EnvironmentId, Message, ModificationSink, NoopAgent};

    /// Everything a `RecordingSink` was asked to do, in order.
    #[derive(Debug)]
    pub enum Recorded {
        Activation(AgentHandle, Point),
        Deactivation(AgentHandle),
        Movement(AgentHandle, Motion),
        Message(Message),
    }

    #[derive(Default)]
    pub struct RecordingSink(pub Mutex<Vec<Recorded>>);

    impl RecordingSink {
        pub fn take(&self) -> Vec<Recorded> {
            std::mem::take(&mut *self.0.lock().unwrap())
        }
    }

    impl ModificationSink for RecordingSink {
        fn enqueue_activation(&self, agent: AgentHandle, at: Point) {
            self.0.lock().unwrap().push(Recorded::Activation(agent, at));
        }
        fn enqueue_deactivation(&self, agent: AgentHandle) {
            self.0.lock().unwrap().push(Recorded::Deactivation(agent));
        }
        fn enqueue_movement(&self, agent: AgentHandle, motion: Motion) {
            self.0.lock().unwrap().push(Recorded::Movement(agent, motion));
        }
        fn enqueue_message(&self, message: Message) {
            self.0.lock().unwrap().push(Recorded::Message(message));
        }
    }

    /// Active handle with id `id` plus a 10×10 space holding it and three
    /// others:
    ///
    ///   self:(5.5,5.5)  a:(6.5,5.5)  b:(5.5,8.5)  c:(0.5,0.5)
    pub fn world(id: u32) -> (AgentHandle, PointSpace) {
        let handle = AgentHandle::new(NoopAgent);
        handle.activate(EnvironmentId::next(), AgentId(id)).unwrap();

        let mut space = PointSpace::new(TileGrid::new(10, 10).unwrap());
        space.insert(AgentId(id), Point::new(5.5, 5.5)).unwrap();
        space.insert(AgentId(id + 1), Point::new(6.5, 5.5)).unwrap();
        space.insert(AgentId(id + 2), Point::new(5.5, 8.5)).unwrap();
        space.insert(AgentId(id + 3), Point::new(0.5, 0.5)).unwrap();
        (handle, space)
    }
}

// ── AgentHandle ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod handle {
    use abm_core::AgentId;

    use crate::{AgentHandle, EnvironmentId, NoopAgent};

    #[test]
    fn new_handle_is_inactive_and_unassigned() {
        let h = AgentHandle::new(NoopAgent);
        assert!(!h.is_active());
        assert_eq!(h.id(), None);
        assert_eq!(h.environment(), None);
    }

    #[test]
    fn activate_assigns_id_and_owner() {
        let env = EnvironmentId::next();
        let h = AgentHandle::new(NoopAgent);
        h.activate(env, AgentId(4)).unwrap();
        assert!(h.is_active());
        assert_eq!(h.id(), Some(AgentId(4)));
        assert_eq!(h.environment(), Some(env));
    }

    #[test]
    fn second_environment_cannot_claim() {
        let a = EnvironmentId::next();
        let b = EnvironmentId::next();
        let h = AgentHandle::new(NoopAgent);
        h.activate(a, AgentId(0)).unwrap();
        assert_eq!(h.activate(b, AgentId(9)), Err(a));
        assert_eq!(h.id(), Some(AgentId(0)));
    }

    #[test]
    fn deactivate_releases_but_keeps_last_id() {
        let env = EnvironmentId::next();
        let h = AgentHandle::new(NoopAgent);
        h.activate(env, AgentId(2)).unwrap();
        assert!(h.deactivate(env));
        assert!(!h.is_active());
        assert_eq!(h.environment(), None);
        assert_eq!(h.id(), Some(AgentId(2)));
    }

    #[test]
    fn deactivate_by_non_owner_is_refused() {
        let owner = EnvironmentId::next();
        let other = EnvironmentId::next();
        let h = AgentHandle::new(NoopAgent);
        h.activate(owner, AgentId(1)).unwrap();
        assert!(!h.deactivate(other));
        assert!(h.is_active());
    }

    #[test]
    fn released_handle_can_be_reactivated() {
        let a = EnvironmentId::next();
        let b = EnvironmentId::next();
        let h = AgentHandle::new(NoopAgent);
        h.activate(a, AgentId(1)).unwrap();
        h.deactivate(a);
        h.activate(b, AgentId(7)).unwrap();
        assert_eq!(h.environment(), Some(b));
        assert_eq!(h.id(), Some(AgentId(7)));
    }

    #[test]
    fn retire_clears_flag_only() {
        let env = EnvironmentId::next();
        let h = AgentHandle::new(NoopAgent);
        h.activate(env, AgentId(0)).unwrap();
        h.retire();
        assert!(!h.is_active());
        assert_eq!(h.environment(), Some(env));
    }

    #[test]
    fn clones_share_state_and_compare_by_identity() {
        let a = AgentHandle::new(NoopAgent);
        let b = a.clone();
        let c = AgentHandle::new(NoopAgent);
        a.activate(EnvironmentId::next(), AgentId(3)).unwrap();
        assert_eq!(b.id(), Some(AgentId(3)));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn environment_ids_are_unique() {
        let a = EnvironmentId::next();
        let b = EnvironmentId::next();
        assert_ne!(a, b);
        assert!(a.get() > 0 && b.get() > 0);
    }
}

// ── StepContext ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod context {
    use abm_core::{AgentId, Motion, Point, Tick};

    use super::helpers::{world, Recorded, RecordingSink};
    use crate::{AgentHandle, NoopAgent, StepContext};

    #[test]
    fn identity_and_position() {
        let (handle, space) = world(10);
        let sink = RecordingSink::default();
        let ctx = StepContext::new(Tick(3), &handle, &space, &sink);
        assert_eq!(ctx.tick, Tick(3));
        assert_eq!(ctx.agent, AgentId(10));
        assert_eq!(ctx.position().unwrap(), Point::new(5.5, 5.5));
        assert_eq!(ctx.handle(), &handle);
    }

    #[test]
    fn neighbors_exclude_self() {
        let (handle, space) = world(0);
        let sink = RecordingSink::default();
        let ctx = StepContext::new(Tick(0), &handle, &space, &sink);
        let ids: Vec<AgentId> = ctx.neighbors(3.0).unwrap().iter().map(|h| h.id).collect();
        assert_eq!(ids, vec![AgentId(1), AgentId(2)]);
    }

    #[test]
    fn nearest_excludes_self_and_honours_k() {
        let (handle, space) = world(0);
        let sink = RecordingSink::default();
        let ctx = StepContext::new(Tick(0), &handle, &space, &sink);
        let ids: Vec<AgentId> = ctx.nearest(2).unwrap().iter().map(|h| h.id).collect();
        assert_eq!(ids, vec![AgentId(1), AgentId(2)]);
        assert!(ctx.nearest(0).unwrap().is_empty());
    }

    #[test]
    fn nearest_with_unbounded_k_returns_all_others() {
        let (handle, space) = world(0);
        let sink = RecordingSink::default();
        let ctx = StepContext::new(Tick(0), &handle, &space, &sink);
        let ids: Vec<AgentId> = ctx.nearest(usize::MAX).unwrap().iter().map(|h| h.id).collect();
        assert_eq!(ids, vec![AgentId(1), AgentId(2), AgentId(3)]);
    }

    #[test]
    fn writes_are_deferred_to_the_sink() {
        let (handle, space) = world(0);
        let sink = RecordingSink::default();
        let ctx = StepContext::new(Tick(0), &handle, &space, &sink);

        let child = AgentHandle::new(NoopAgent);
        ctx.move_by(Motion::new(1.0, 0.0));
        ctx.spawn(child.clone(), Point::new(2.5, 2.5));
        ctx.send(vec![AgentId(1)], vec![42]);
        ctx.remove_self();

        // The space itself is untouched.
        assert_eq!(space.position_of(AgentId(0)).unwrap(), Point::new(5.5, 5.5));
        assert_eq!(space.len(), 4);

        let recorded = sink.take();
        assert_eq!(recorded.len(), 4);
        assert!(matches!(&recorded[0], Recorded::Movement(h, m) if *h == handle && *m == Motion::new(1.0, 0.0)));
        assert!(matches!(&recorded[1], Recorded::Activation(h, p) if *h == child && *p == Point::new(2.5, 2.5)));
        match &recorded[2] {
            Recorded::Message(msg) => {
                assert_eq!(msg.from, Some(AgentId(0)));
                assert_eq!(msg.to, vec![AgentId(1)]);
                assert_eq!(msg.payload, vec![42]);
            }
            other => panic!("expected message, got {other:?}"),
        }
        assert!(matches!(&recorded[3], Recorded::Deactivation(h) if *h == handle));
    }

    #[test]
    fn retire_clears_active_flag_immediately() {
        let (handle, space) = world(0);
        let sink = RecordingSink::default();
        let ctx = StepContext::new(Tick(0), &handle, &space, &sink);
        ctx.retire();
        assert!(!handle.is_active());
        assert!(sink.take().is_empty());
    }

    #[test]
    fn missing_agent_position_is_an_error() {
        let handle = AgentHandle::new(NoopAgent);
        let (_, space) = world(0);
        let sink = RecordingSink::default();
        let ctx = StepContext::new(Tick(0), &handle, &space, &sink);
        assert!(ctx.position().is_err());
    }
}

// ── Agent / errors ────────────────────────────────────────────────────────────

#[cfg(test)]
mod agent {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use abm_core::{AgentId, AgentRng, SimConfig, Tick};
    use abm_spatial::SpatialError;

    use super::helpers::{world, RecordingSink};
    use crate::{Agent, AgentError, AgentResult, Message, NoopAgent, StepContext};

    #[derive(Default)]
    struct Inbox(AtomicUsize);

    impl Agent for Inbox {
        fn execute(&self, _ctx: &StepContext<'_>, _rng: &mut AgentRng) -> AgentResult<()> {
            Err(AgentError::failed("inbox does not execute"))
        }
        fn receive(&self, message: &Message) {
            self.0.fetch_add(message.payload.len(), Ordering::Relaxed);
        }
    }

    #[test]
    fn noop_agent_succeeds() {
        let (handle, space) = world(0);
        let sink = RecordingSink::default();
        let ctx = StepContext::new(Tick(0), &handle, &space, &sink);
        let mut rng = AgentRng::for_step(SimConfig::default().seed, AgentId(0), Tick(0));
        assert!(NoopAgent.execute(&ctx, &mut rng).is_ok());
    }

    #[test]
    fn receive_is_called_through_trait() {
        let inbox = Inbox::default();
        let agent: &dyn Agent = &inbox;
        agent.receive(&Message::direct(None, AgentId(0), vec![1, 2, 3]));
        assert_eq!(inbox.0.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn default_receive_ignores_message() {
        NoopAgent.receive(&Message::direct(Some(AgentId(1)), AgentId(0), vec![9]));
    }

    #[test]
    fn errors_display_and_convert() {
        assert_eq!(AgentError::failed("boom").to_string(), "agent failed: boom");
        let e: AgentError = SpatialError::NotFound(AgentId(5)).into();
        assert!(matches!(e, AgentError::Spatial(SpatialError::NotFound(AgentId(5)))));
    }
}
