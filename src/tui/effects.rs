//! Executes [`SessionCmd`] side-effects against the admin surface.
//!
//! Each admin command blocks until its call finishes and answers with exactly
//! one [`SessionMsg`]. `Quit` and `None` are handled by the runtime.

#![allow(missing_docs)]

use std::io::Write;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::debug;

use crate::core::errors::{Result, VgwError};
use crate::ops::Services;

use super::model::{PrivateOutcome, PublicOutcome, SessionCmd, SessionMsg};

/// OSC 52 "set clipboard" sequence carrying `text`.
#[must_use]
pub fn osc52(text: &str) -> String {
    format!("\x1b]52;c;{}\x07", STANDARD.encode(text))
}

/// Hand `text` to the terminal's clipboard.
pub fn copy_to_clipboard(out: &mut impl Write, text: &str) -> Result<()> {
    out.write_all(osc52(text).as_bytes())
        .and_then(|()| out.flush())
        .map_err(|err| VgwError::io("terminal", err))
}

/// Run one command. `None` means there is nothing to feed back.
pub fn execute(services: &mut Services, out: &mut impl Write, cmd: SessionCmd) -> Option<SessionMsg> {
    debug!(command = command_name(&cmd), "executing session command");
    let msg = match cmd {
        SessionCmd::None | SessionCmd::Quit => return None,
        SessionCmd::LoadUsers(reload) => SessionMsg::UsersLoaded {
            reload,
            result: services.list_users(),
        },
        SessionCmd::LoadBuckets => SessionMsg::BucketsLoaded {
            result: services.list_buckets(),
        },
        SessionCmd::CreateUser(user) => SessionMsg::UserSaved {
            result: services.create_user(&user),
            access: user.access,
            updated: false,
        },
        SessionCmd::UpdateUser(user) => SessionMsg::UserSaved {
            result: services.update_user(&user),
            access: user.access,
            updated: true,
        },
        SessionCmd::DeleteUser(access) => SessionMsg::UserDeleted {
            result: services.delete_user(&access),
            access,
        },
        SessionCmd::CreateBucket { spec, owner } => {
            let result = services.create_bucket(&spec);
            let owner_result = (result.is_ok() && !owner.is_empty())
                .then(|| services.change_owner(&spec.name, &owner));
            SessionMsg::BucketCreated {
                name: spec.name,
                result,
                owner_result,
            }
        }
        SessionCmd::ChangeOwner { bucket, owner } => SessionMsg::OwnerChanged {
            result: services.change_owner(&bucket, &owner),
            bucket,
            owner,
        },
        SessionCmd::Provision(req) => SessionMsg::Provisioned {
            result: services.provision(&req),
        },
        SessionCmd::RemoveBucket(name) => SessionMsg::BucketRemoved {
            result: services.remove_bucket(&name),
            name,
        },
        SessionCmd::MakePublic {
            bucket,
            owner,
            from_list,
        } => SessionMsg::PublicApplied {
            outcome: make_public(services, &bucket, &owner, from_list),
            bucket,
            owner,
            from_list,
        },
        SessionCmd::MakePrivate(bucket) => SessionMsg::PrivateApplied {
            outcome: make_private(services, &bucket),
            bucket,
        },
        SessionCmd::Copy(text) => SessionMsg::Copied {
            result: copy_to_clipboard(out, &text),
        },
    };
    Some(msg)
}

/// Commands carry secrets, so only the variant is logged.
const fn command_name(cmd: &SessionCmd) -> &'static str {
    match cmd {
        SessionCmd::None => "none",
        SessionCmd::Quit => "quit",
        SessionCmd::LoadUsers(_) => "load_users",
        SessionCmd::LoadBuckets => "load_buckets",
        SessionCmd::CreateUser(_) => "create_user",
        SessionCmd::UpdateUser(_) => "update_user",
        SessionCmd::DeleteUser(_) => "delete_user",
        SessionCmd::CreateBucket { .. } => "create_bucket",
        SessionCmd::ChangeOwner { .. } => "change_owner",
        SessionCmd::Provision(_) => "provision",
        SessionCmd::RemoveBucket(_) => "remove_bucket",
        SessionCmd::MakePublic { .. } => "make_public",
        SessionCmd::MakePrivate(_) => "make_private",
        SessionCmd::Copy(_) => "copy",
    }
}

/// The list action probes first so an existing policy is never overwritten.
fn make_public(services: &mut Services, bucket: &str, owner: &str, probe: bool) -> PublicOutcome {
    if probe {
        match services.policy_exists(bucket) {
            Ok(true) => return PublicOutcome::AlreadyPublic,
            Ok(false) => {}
            Err(err) => return PublicOutcome::ProbeFailed(err),
        }
    }
    match services.make_public(bucket, owner) {
        Ok(()) => PublicOutcome::Applied,
        Err(err) => PublicOutcome::SetFailed(err),
    }
}

fn make_private(services: &mut Services, bucket: &str) -> PrivateOutcome {
    match services.policy_exists(bucket) {
        Ok(false) => PrivateOutcome::AlreadyPrivate,
        Ok(true) => match services.make_private(bucket) {
            Ok(()) => PrivateOutcome::Removed,
            Err(err) => PrivateOutcome::RemoveFailed(err),
        },
        Err(err) => PrivateOutcome::ProbeFailed(err),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Arc;

    use super::*;
    use crate::accounts::{AccountRegistry, User};
    use crate::dataset::BucketSpec;
    use crate::logger::audit::AuditLog;
    use crate::ops::fakes::{FakeAdmin, FakeDatasets};
    use crate::tui::model::Reload;

    struct Rig {
        _dir: tempfile::TempDir,
        api: Arc<FakeAdmin>,
        services: Services,
    }

    fn rig(api: FakeAdmin, datasets: FakeDatasets) -> Rig {
        let dir = tempfile::tempdir().unwrap();
        let users = dir.path().join("users.json");
        fs::write(
            &users,
            r#"{"accessAccounts":{"ann":{"access":"ann","secret":"s1","role":"admin"}}}"#,
        )
        .unwrap();
        let api = Arc::new(api);
        let services = Services::new(
            Box::new(Arc::clone(&api)),
            Box::new(datasets),
            AccountRegistry::new(users),
            AuditLog::disabled(),
        );
        Rig {
            _dir: dir,
            api,
            services,
        }
    }

    fn run(rig: &mut Rig, cmd: SessionCmd) -> SessionMsg {
        let mut sink: Vec<u8> = Vec::new();
        execute(&mut rig.services, &mut sink, cmd).unwrap()
    }

    #[test]
    fn osc52_wraps_base64_payload() {
        assert_eq!(osc52("hi"), "\x1b]52;c;aGk=\x07");
        let mut out = Vec::new();
        copy_to_clipboard(&mut out, "Access Key: a\nSecret Key: b").unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("\x1b]52;c;"));
        assert!(text.ends_with('\x07'));
    }

    #[test]
    fn quit_and_none_produce_nothing() {
        let mut rig = rig(FakeAdmin::default(), FakeDatasets::default());
        let mut sink: Vec<u8> = Vec::new();
        assert!(execute(&mut rig.services, &mut sink, SessionCmd::Quit).is_none());
        assert!(execute(&mut rig.services, &mut sink, SessionCmd::None).is_none());
        assert!(rig.api.calls().is_empty());
    }

    #[test]
    fn users_load_from_registry() {
        let mut rig = rig(FakeAdmin::default(), FakeDatasets::default());
        let SessionMsg::UsersLoaded { reload, result } =
            run(&mut rig, SessionCmd::LoadUsers(Reload::Open))
        else {
            panic!("expected users");
        };
        assert_eq!(reload, Reload::Open);
        assert_eq!(result.unwrap()[0].access, "ann");
    }

    #[test]
    fn bucket_owner_is_skipped_when_blank() {
        let mut rig = rig(FakeAdmin::default(), FakeDatasets::default());
        let SessionMsg::BucketCreated { owner_result, .. } = run(
            &mut rig,
            SessionCmd::CreateBucket {
                spec: BucketSpec::new("b", "1T"),
                owner: String::new(),
            },
        ) else {
            panic!("expected bucket");
        };
        assert!(owner_result.is_none());

        let SessionMsg::BucketCreated { owner_result, .. } = run(
            &mut rig,
            SessionCmd::CreateBucket {
                spec: BucketSpec::new("c", "1T"),
                owner: "ann".into(),
            },
        ) else {
            panic!("expected bucket");
        };
        assert!(matches!(owner_result, Some(Ok(()))));
        assert!(rig.api.calls().contains(&"change_bucket_owner c ann".to_string()));
    }

    #[test]
    fn list_public_probes_before_setting() {
        let api = FakeAdmin::default();
        api.set_policy("media", "{}");
        let mut rig = rig(api, FakeDatasets::default());
        let SessionMsg::PublicApplied { outcome, .. } = run(
            &mut rig,
            SessionCmd::MakePublic {
                bucket: "media".into(),
                owner: "ann".into(),
                from_list: true,
            },
        ) else {
            panic!("expected public");
        };
        assert!(matches!(outcome, PublicOutcome::AlreadyPublic));
        assert!(!rig.api.calls().iter().any(|c| c.starts_with("set_bucket_policy")));
    }

    #[test]
    fn form_public_sets_without_probe() {
        let mut rig = rig(FakeAdmin::default(), FakeDatasets::default());
        let SessionMsg::PublicApplied { outcome, .. } = run(
            &mut rig,
            SessionCmd::MakePublic {
                bucket: "media".into(),
                owner: "ann".into(),
                from_list: false,
            },
        ) else {
            panic!("expected public");
        };
        assert!(matches!(outcome, PublicOutcome::Applied));
        assert_eq!(rig.api.calls(), vec!["set_bucket_policy media".to_string()]);
    }

    #[test]
    fn set_failure_is_reported_for_fallback() {
        let api = FakeAdmin::default();
        api.fail("set_bucket_policy", 403, "AccessDenied");
        let mut rig = rig(api, FakeDatasets::default());
        let SessionMsg::PublicApplied { outcome, .. } = run(
            &mut rig,
            SessionCmd::MakePublic {
                bucket: "media".into(),
                owner: "ann".into(),
                from_list: true,
            },
        ) else {
            panic!("expected public");
        };
        assert!(matches!(outcome, PublicOutcome::SetFailed(_)));
    }

    #[test]
    fn private_without_policy_is_a_no_op() {
        let mut rig = rig(FakeAdmin::default(), FakeDatasets::default());
        let SessionMsg::PrivateApplied { outcome, .. } =
            run(&mut rig, SessionCmd::MakePrivate("media".into()))
        else {
            panic!("expected private");
        };
        assert!(matches!(outcome, PrivateOutcome::AlreadyPrivate));
        assert!(!rig.api.calls().iter().any(|c| c.starts_with("delete_bucket_policy")));
    }

    #[test]
    fn private_removes_existing_policy() {
        let api = FakeAdmin::default();
        api.set_policy("media", "{}");
        let mut rig = rig(api, FakeDatasets::default());
        let SessionMsg::PrivateApplied { outcome, .. } =
            run(&mut rig, SessionCmd::MakePrivate("media".into()))
        else {
            panic!("expected private");
        };
        assert!(matches!(outcome, PrivateOutcome::Removed));
        assert!(rig.api.policies.lock().unwrap().is_empty());
    }

    #[test]
    fn user_commands_carry_the_access_key() {
        let mut rig = rig(FakeAdmin::default(), FakeDatasets::default());
        let user = User {
            access: "zed".into(),
            secret: "s".into(),
            role: "user".into(),
            ..User::default()
        };
        let SessionMsg::UserSaved {
            access, updated, ..
        } = run(&mut rig, SessionCmd::UpdateUser(user))
        else {
            panic!("expected save");
        };
        assert_eq!(access, "zed");
        assert!(updated);
    }
}
