use chrono::{Duration, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use siakad::core::gate::{transition, Effect, Event, GateState, ProfileOutcome};
use siakad::{Principal, Profile, Role, Status};

fn principal(id: &str) -> Principal {
    let now = Utc::now();
    Principal::new(
        id,
        Some(format!("{}@example.com", id)),
        "token",
        now,
        now + Duration::hours(1),
    )
}

// Initial load, profile resolution, logout.
fn sign_in_cycle(principal: &Principal, profile: &Profile) -> GateState {
    let (state, _) = GateState::initial();
    let (state, effects) = transition(state, Event::SessionLoaded(Some(principal.clone())));

    let lookup = effects
        .iter()
        .find_map(|effect| match effect {
            Effect::FetchProfile { lookup, .. } => Some(*lookup),
            _ => None,
        })
        .unwrap();
    let (state, _) = transition(
        state,
        Event::ProfileLoaded {
            lookup,
            principal: principal.id().clone(),
            outcome: ProfileOutcome::Found(profile.clone()),
        },
    );
    let (state, _) = transition(state, Event::LogoutRequested);
    state
}

pub fn cycle(c: &mut Criterion) {
    let principal = principal("u1");
    let profile = Profile::new("u1", "Siti", Role::Student, Status::Approved);

    c.bench_function("sign_in_cycle", |b| {
        b.iter(|| sign_in_cycle(black_box(&principal), black_box(&profile)));
    });
}

pub fn superseded(c: &mut Criterion) {
    const NUM_CHANGES: usize = 32;
    let principals = (0..NUM_CHANGES)
        .map(|i| principal(&format!("u{}", i)))
        .collect::<Vec<_>>();

    c.bench_function("superseded_lookups", |b| {
        b.iter(|| {
            let (mut state, _) = GateState::initial();
            for p in principals.iter() {
                let (next, _) = transition(state, Event::PrincipalChanged(Some(p.clone())));
                state = next;
            }
            black_box(state)
        });
    });
}

criterion_group!(benches, cycle, superseded);
criterion_main!(benches);
