mod common;

use chedit_edit::{
    Delta, EditConfig, EditContext, EditError, EditLocator, EditMutator, EditState, TreeEdit,
};
use chedit_refs::RefStore;
use common::{Fixture, CHANGE};

fn modify(path: &str, content: &[u8]) -> Delta {
    Delta::Tree(TreeEdit::Modify {
        path: path.into(),
        content: content.to_vec(),
        mode: None,
    })
}

#[test]
fn lost_race_conflicts_and_keeps_winner() {
    let fx = Fixture::new();
    let user = fx.user();
    fx.service.create_edit(&user, CHANGE).unwrap();

    let repo = fx.open();
    let config = EditConfig::default();
    let ctx = EditContext {
        user: &fx.owner,
        repo: &repo,
        metadata: fx.metadata.as_ref(),
        config: &config,
    };
    let change = fx.change();
    let observed = EditLocator::new(ctx).find(fx.owner.id, &change).unwrap();
    assert!(matches!(observed, EditState::Present(_)));

    let winner = fx
        .service
        .modify_file(&user, CHANGE, "a.txt", b"winner\n".to_vec(), None)
        .unwrap();

    let err = EditMutator::new(ctx)
        .apply(&change, &observed, modify("a.txt", b"loser\n"))
        .unwrap_err();
    assert!(err.is_conflict(), "{err:?}");

    let current = fx.stores.refs.read_ref(&winner.ref_name).unwrap().unwrap();
    assert_eq!(current.target, winner.commit_id);
    assert_eq!(fx.file("a.txt").unwrap(), b"winner\n");
}

#[test]
fn racing_implicit_creation_conflicts() {
    let fx = Fixture::new();
    let repo = fx.open();
    let config = EditConfig::default();
    let ctx = EditContext {
        user: &fx.owner,
        repo: &repo,
        metadata: fx.metadata.as_ref(),
        config: &config,
    };
    let change = fx.change();

    let first = EditMutator::new(ctx)
        .apply(&change, &EditState::Absent, modify("a.txt", b"first\n"))
        .unwrap();
    let err = EditMutator::new(ctx)
        .apply(&change, &EditState::Absent, modify("a.txt", b"second\n"))
        .unwrap_err();
    assert!(err.is_conflict(), "{err:?}");
    assert_eq!(
        fx.stores.refs.read_ref(&first.ref_name).unwrap().unwrap().target,
        first.commit_id
    );
}

#[test]
fn ref_store_failure_changes_nothing() {
    let fx = Fixture::new();
    let user = fx.user();
    let before = fx
        .service
        .modify_file(&user, CHANGE, "a.txt", b"x\n".to_vec(), None)
        .unwrap();

    fx.stores.refs.set_fail_writes(true);
    let err = fx
        .service
        .modify_file(&user, CHANGE, "a.txt", b"y\n".to_vec(), None)
        .unwrap_err();
    assert!(matches!(err, EditError::Io(_)), "{err:?}");
    assert!(matches!(
        fx.service.delete_edit(&user, CHANGE),
        Err(EditError::Io(_))
    ));
    fx.stores.refs.set_fail_writes(false);

    let after = fx.service.get_edit(&user, CHANGE).unwrap().unwrap();
    assert_eq!(after.commit_id, before.commit_id);
    assert_eq!(fx.file("a.txt").unwrap(), b"x\n");
}

#[test]
fn object_store_failure_leaves_ref_alone() {
    let fx = Fixture::new();
    let user = fx.user();
    fx.stores.objects.set_read_only(true);
    let err = fx
        .service
        .modify_file(&user, CHANGE, "a.txt", b"x\n".to_vec(), None)
        .unwrap_err();
    assert!(matches!(err, EditError::Io(_)), "{err:?}");
    assert!(fx.service.get_edit(&user, CHANGE).unwrap().is_none());
}

#[test]
fn concurrent_mutations_never_lose_a_write_silently() {
    let fx = Fixture::new();
    let user = fx.user();
    fx.service.create_edit(&user, CHANGE).unwrap();

    let results: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let (service, user) = (&fx.service, &user);
                s.spawn(move || {
                    let path = format!("file-{i}.txt");
                    service
                        .modify_file(user, CHANGE, &path, format!("{i}\n").into_bytes(), None)
                        .map(|_| path)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let mut written = Vec::new();
    for result in results {
        match result {
            Ok(path) => written.push(path),
            Err(e) => assert!(e.is_conflict(), "unexpected error: {e:?}"),
        }
    }
    assert!(!written.is_empty());

    // The surviving edit holds the last successful write, and at most one
    // edit ref exists for the change.
    let files = fx.service.list_files(&user, CHANGE).unwrap();
    assert!(written.iter().any(|p| files.contains(p)));
    let edits = fx.stores.refs.list_refs("refs/users/").unwrap();
    assert_eq!(edits.len(), 1);
}
