use criterion::{Criterion, black_box, criterion_group, criterion_main};

use warden_auth::{Permission, Principal, Role, RoleName};
use warden_core::{PolicyConfig, PrincipalId, TenantId};
use warden_service::Warden;

fn bench_config() -> PolicyConfig {
    PolicyConfig::new(
        ["post.read", "post.write", "post.delete"],
        ["admin", "editor"],
        ["BETA_UI"],
    )
}

fn setup() -> (Warden, Principal) {
    let warden = Warden::in_memory(bench_config());
    let tenant = TenantId::new();

    let permissions: Vec<Permission> = (0..32)
        .map(|i| Permission::new(format!("module{}.action", i)))
        .chain([Permission::new("post.write")])
        .collect();

    warden
        .roles()
        .upsert(Role::for_tenant(tenant, RoleName::new("editor"), permissions))
        .expect("seed role");

    let principal = Principal::new(PrincipalId::new(), tenant, RoleName::new("editor"));
    (warden, principal)
}

fn authorize_benchmarks(c: &mut Criterion) {
    let (warden, principal) = setup();

    c.bench_function("authorize_allow", |b| {
        let required = Permission::new("post.write");
        b.iter(|| {
            let decision = warden.authorize(black_box(&principal), black_box(&required));
            assert!(decision.is_ok());
        })
    });

    c.bench_function("authorize_deny_missing_permission", |b| {
        let required = Permission::new("post.purge");
        b.iter(|| {
            let decision = warden.authorize(black_box(&principal), black_box(&required));
            assert!(decision.is_err());
        })
    });

    c.bench_function("authorize_role_exact_match", |b| {
        let required = RoleName::new("editor");
        b.iter(|| {
            let decision = warden.authorize_role(black_box(&principal), black_box(&required));
            assert!(decision.is_ok());
        })
    });
}

criterion_group!(benches, authorize_benchmarks);
criterion_main!(benches);
