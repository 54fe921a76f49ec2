//! Credential Resolver Tests
//!
//! Drives the resolver through in-process hooks that speak the plugin ABI:
//! - Hook override order
//! - Two-call buffer sizing
//! - Hook failures without fallback
//! - Native fallback
//! - Concurrent resolution

use std::ffi::{c_char, c_int};
use std::sync::Arc;
use std::thread;

use idmap_core::{
    CredentialResolver, FixedIdentity, HookOrigin, HookSetBuilder, HostIdentity,
    MemoryIdentityDatabase, NumericCredential, NumericToTextualHook, PluginHooks, PolicyError,
    PolicyRegistry, TextualToNumericHook,
};
use idmap_policy_sdk::ffi::{numeric_to_textual_entry, textual_to_numeric_entry};
use idmap_policy_sdk::{PolicyError as HookError, TextualIdentity};

fn identity_a(uid: u32, _gid: u32) -> Result<TextualIdentity, HookError> {
    Ok(TextualIdentity::new(format!("a-{}", uid), vec!["a".into()]))
}

/// Group list grows with the gid, so buffer sizes vary per request.
fn identity_c(uid: u32, gid: u32) -> Result<TextualIdentity, HookError> {
    if uid == 404 {
        return Err(HookError::NotFound(format!("uid {}", uid)));
    }
    let groups = (0..=gid % 7).map(|i| format!("grp{}-{}", gid, i)).collect();
    Ok(TextualIdentity::new(format!("user-{}", uid), groups))
}

unsafe extern "C" fn hook_a(
    uid: c_int,
    gid: c_int,
    out_user_id: *mut c_char,
    out_user_id_size: *mut usize,
    out_group_ids: *mut c_char,
    out_group_ids_size: *mut usize,
) -> c_int {
    numeric_to_textual_entry(
        uid,
        gid,
        out_user_id,
        out_user_id_size,
        out_group_ids,
        out_group_ids_size,
        identity_a,
    )
}

unsafe extern "C" fn hook_c(
    uid: c_int,
    gid: c_int,
    out_user_id: *mut c_char,
    out_user_id_size: *mut usize,
    out_group_ids: *mut c_char,
    out_group_ids_size: *mut usize,
) -> c_int {
    numeric_to_textual_entry(
        uid,
        gid,
        out_user_id,
        out_user_id_size,
        out_group_ids,
        out_group_ids_size,
        identity_c,
    )
}

unsafe extern "C" fn hook_b(
    user_id: *const c_char,
    group_ids: *const c_char,
    out_uid: *mut c_int,
    out_gid: *mut c_int,
) -> c_int {
    textual_to_numeric_entry(user_id, group_ids, out_uid, out_gid, |user, group| {
        match (user, group) {
            ("alice", "staff") => Ok((1000, 50)),
            _ => Err(HookError::PermissionDenied(user.to_string())),
        }
    })
}

fn numeric_only(func: idmap_core::abi::NumericToTextualFn) -> PluginHooks {
    PluginHooks {
        numeric_to_textual: Some(unsafe { NumericToTextualHook::in_process(func) }),
        textual_to_numeric: None,
    }
}

fn textual_only(func: idmap_core::abi::TextualToNumericFn) -> PluginHooks {
    PluginHooks {
        numeric_to_textual: None,
        textual_to_numeric: Some(unsafe { TextualToNumericHook::in_process(func) }),
    }
}

fn database() -> MemoryIdentityDatabase {
    MemoryIdentityDatabase::new()
        .with_user(0, "root")
        .with_user(1000, "alice")
        .with_group(0, "root")
        .with_group(50, "staff")
}

fn resolver_with(plugins: Vec<PluginHooks>) -> CredentialResolver {
    let mut builder = HookSetBuilder::new();
    for hooks in plugins {
        builder.overlay(hooks);
    }
    let registry = PolicyRegistry::from_hooks(builder.freeze());
    CredentialResolver::new(Arc::new(registry)).with_database(database())
}

#[test]
fn test_hooks_from_different_plugins_combine() {
    let resolver = resolver_with(vec![numeric_only(hook_a), textual_only(hook_b)]);

    let textual = resolver
        .resolve_numeric_to_textual(NumericCredential::new(7, 7))
        .unwrap();
    assert_eq!(textual.user_id(), "a-7");

    let numeric = resolver.resolve_textual_to_numeric("alice", "staff").unwrap();
    assert_eq!(numeric, NumericCredential::new(1000, 50));
}

#[test]
fn test_last_loaded_hook_wins() {
    let resolver = resolver_with(vec![numeric_only(hook_a), numeric_only(hook_c)]);

    let textual = resolver
        .resolve_numeric_to_textual(NumericCredential::new(7, 1))
        .unwrap();
    assert_eq!(textual.user_id(), "user-7");
    assert_eq!(
        resolver.registry().hooks().describe().numeric_to_textual,
        Some(HookOrigin::InProcess)
    );
}

#[test]
fn test_sizing_then_fill_round_trip() {
    let resolver = resolver_with(vec![numeric_only(hook_c)]);

    for uid in [0u32, 1, 1000, 65534, u32::MAX] {
        for gid in 0..14u32 {
            let textual = resolver
                .resolve_numeric_to_textual(NumericCredential::new(uid, gid))
                .unwrap();
            let expected = identity_c(uid, gid).unwrap();
            assert_eq!(textual.user_id(), expected.user_id);
            assert_eq!(textual.group_ids(), expected.group_ids.as_slice());
            assert_eq!(textual.primary_group(), format!("grp{}-0", gid));
        }
    }
}

#[test]
fn test_hook_failure_does_not_fall_back() {
    let resolver = resolver_with(vec![numeric_only(hook_c), textual_only(hook_b)]);

    let err = resolver
        .resolve_numeric_to_textual(NumericCredential::new(404, 0))
        .unwrap_err();
    assert!(matches!(
        err,
        PolicyError::HookExecution { code, .. } if code == HookError::NotFound(String::new()).errno()
    ));

    // root exists in the native database, but the hook decides.
    let err = resolver.resolve_textual_to_numeric("root", "root").unwrap_err();
    assert!(matches!(err, PolicyError::HookExecution { .. }));
}

#[test]
fn test_interior_nul_is_invalid_input() {
    let resolver = resolver_with(vec![textual_only(hook_b)]);
    let err = resolver
        .resolve_textual_to_numeric("ali\0ce", "staff")
        .unwrap_err();
    assert!(matches!(err, PolicyError::InvalidInput(_)));
}

#[test]
fn test_native_fallback_per_direction() {
    let resolver = resolver_with(vec![textual_only(hook_b)]);

    let textual = resolver
        .resolve_numeric_to_textual(NumericCredential::new(0, 0))
        .unwrap();
    assert_eq!(textual.user_id(), "root");
    assert_eq!(textual.group_ids(), ["root".to_string()]);
}

#[test]
fn test_unknown_uid_is_not_found() {
    let resolver = resolver_with(vec![]);
    let err = resolver
        .resolve_numeric_to_textual(NumericCredential::new(4242, 0))
        .unwrap_err();
    assert!(matches!(err, PolicyError::CredentialNotFound(_)));
}

#[test]
fn test_empty_user_id_without_hook() {
    let resolver = resolver_with(vec![numeric_only(hook_a)]);
    let err = resolver
        .resolve_textual_to_numeric("", "anygroup")
        .unwrap_err();
    assert!(matches!(err, PolicyError::InvalidInput(_)));
}

#[test]
fn test_current_user_uses_host_identity() {
    let resolver = resolver_with(vec![numeric_only(hook_c)])
        .with_host_source(FixedIdentity(HostIdentity::new(12, 3)));

    let me = resolver.resolve_current_user().unwrap();
    assert_eq!(me.user_id(), "user-12");
    assert_eq!(me.group_ids().len(), 4);
}

#[cfg(unix)]
#[test]
fn test_current_user_fills_missing_ids_from_process() {
    let resolver = resolver_with(vec![numeric_only(hook_a)]).with_host_source(|| HostIdentity {
        user_id: Some(99),
        group_id: None,
    });

    let numeric = resolver.current_numeric().unwrap();
    assert_eq!(numeric.user_id, 99);
    assert_eq!(numeric.group_id, unsafe { libc::getegid() } as u32);
}

#[test]
fn test_concurrent_resolution_matches_sequential() {
    let resolver = resolver_with(vec![numeric_only(hook_c)]);
    let inputs: Vec<NumericCredential> = (0..64u32)
        .map(|i| NumericCredential::new(1000 + i, i))
        .collect();

    let sequential: Vec<_> = inputs
        .iter()
        .map(|c| resolver.resolve_numeric_to_textual(*c).unwrap())
        .collect();

    thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let resolver = resolver.clone();
                let inputs = &inputs;
                scope.spawn(move || {
                    inputs
                        .iter()
                        .map(|c| resolver.resolve_numeric_to_textual(*c).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), sequential);
        }
    });
}

#[cfg(target_os = "linux")]
#[test]
fn test_system_database_root() {
    let resolver = CredentialResolver::new(Arc::new(PolicyRegistry::empty()));
    let root = resolver
        .resolve_numeric_to_textual(NumericCredential::new(0, 0))
        .unwrap();
    assert_eq!(root.user_id(), "root");
    assert_eq!(root.group_ids(), ["root".to_string()]);
}

#[cfg(unix)]
#[test]
fn test_system_database_unknown_uid() {
    let resolver = CredentialResolver::new(Arc::new(PolicyRegistry::empty()));
    let err = resolver
        .resolve_numeric_to_textual(NumericCredential::new(3_999_999_999, 0))
        .unwrap_err();
    assert!(matches!(err, PolicyError::CredentialNotFound(_)));
}
