#![allow(dead_code)]

use std::sync::Arc;

use chedit_edit::{
    Account, AccountId, Change, ChangeEditService, ChangeId, ChangeKey, ChangeMetadata,
    ChangeStatus, CommitMessagePolicy, CurrentUser, DefaultChangeKindClassifier, EditConfig,
    EntryMode, InMemoryChangeMetadata, InMemoryRepository, InMemoryRepositoryManager, ObjectId,
    PatchSet, PatchSetId, PatchSetInsertion, PersonIdent, RecordingIndexer, RepositoryManager,
    Timestamp, Tree, TreeEntry,
};
use chedit_store::{Commit, ObjectInserter, ObjectStore};

pub const PROJECT: &str = "demo";
pub const CHANGE: ChangeId = ChangeId(1);

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// A project with one change at patch set 1, edited by its owner.
///
/// The initial commit holds `README`; patch set 1 adds `a.txt` and `b.txt`
/// on top of it.
pub struct Fixture {
    pub repos: Arc<InMemoryRepositoryManager>,
    pub stores: InMemoryRepository,
    pub metadata: Arc<InMemoryChangeMetadata>,
    pub indexer: Arc<RecordingIndexer>,
    pub service: ChangeEditService,
    pub owner: Account,
    pub key: ChangeKey,
    pub initial: ObjectId,
    pub ps1: ObjectId,
}

pub const A_TXT: &str = "line1\nline2\nline3\n";
pub const B_TXT: &str = "alpha\nbeta\n";

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(EditConfig::default())
    }

    pub fn with_config(config: EditConfig) -> Self {
        init_tracing();
        let repos = Arc::new(InMemoryRepositoryManager::new());
        let stores = repos.create(PROJECT);
        let metadata = Arc::new(InMemoryChangeMetadata::new(
            repos.clone(),
            CommitMessagePolicy::from(&config.commit_message),
        ));
        let indexer = Arc::new(RecordingIndexer::new());
        let service = ChangeEditService::new(
            repos.clone(),
            metadata.clone(),
            Arc::new(DefaultChangeKindClassifier),
            indexer.clone(),
            config,
        );
        let owner = Account::new(AccountId(1_000_096), "Jane Roe", "jane@example.com");
        let key = ChangeKey::for_commit(&ObjectId::from_bytes(b"change-1"));

        let mut fixture = Self {
            repos,
            stores,
            metadata,
            indexer,
            service,
            owner,
            key,
            initial: ObjectId::null(),
            ps1: ObjectId::null(),
        };
        fixture.initial = fixture.commit(&[("README", "hello\n")], vec![], "Initial commit\n");
        let message = fixture.message("Add parser");
        fixture.ps1 = fixture.commit(
            &[("README", "hello\n"), ("a.txt", A_TXT), ("b.txt", B_TXT)],
            vec![fixture.initial],
            &message,
        );
        let ps = PatchSetId::new(CHANGE, 1);
        fixture
            .metadata
            .insert_change(
                Change {
                    id: CHANGE,
                    key: fixture.key.clone(),
                    project: PROJECT.into(),
                    owner: fixture.owner.id,
                    status: ChangeStatus::New,
                    current_patch_set: ps,
                },
                PatchSet {
                    id: ps,
                    commit: fixture.ps1,
                    draft: false,
                    uploader: fixture.owner.id,
                },
            )
            .unwrap();
        fixture
    }

    pub fn user(&self) -> CurrentUser {
        CurrentUser::Identified(self.owner.clone())
    }

    /// A message carrying this change's `Change-Id` footer.
    pub fn message(&self, subject: &str) -> String {
        format!("{subject}\n\nChange-Id: {}\n", self.key)
    }

    pub fn author() -> PersonIdent {
        PersonIdent::new("A U Thor", "author@example.com", Timestamp::new(1_600_000_000_000, 0))
    }

    /// Write a commit with the given files and return its id.
    pub fn commit(&self, files: &[(&str, &str)], parents: Vec<ObjectId>, message: &str) -> ObjectId {
        let mut inserter = ObjectInserter::new(self.stores.objects.as_ref());
        let entries = files
            .iter()
            .map(|(path, content)| {
                TreeEntry::new(*path, EntryMode::Regular, inserter.insert_blob(content.as_bytes().to_vec()))
            })
            .collect();
        let tree = inserter.insert_tree(&Tree::new(entries)).unwrap();
        let id = inserter
            .insert_commit(&Commit {
                tree,
                parents,
                author: Self::author(),
                committer: Self::author(),
                message: message.to_string(),
            })
            .unwrap();
        inserter.flush().unwrap();
        id
    }

    /// Upload a new patch set on top of the initial commit, as a push would.
    pub fn push_patch_set(&self, files: &[(&str, &str)], subject: &str) -> PatchSetId {
        let change = self.change();
        let commit = self.commit(files, vec![self.initial], &self.message(subject));
        let id = change.current_patch_set.next();
        self.metadata
            .insert_patch_set(
                &change,
                PatchSetInsertion {
                    id,
                    commit,
                    draft: false,
                    uploader: self.owner.id,
                    message: format!("Uploaded patch set {}.", id.number),
                    expected_current: change.current_patch_set,
                },
            )
            .unwrap();
        id
    }

    pub fn change(&self) -> Change {
        self.metadata.change(CHANGE).unwrap().unwrap()
    }

    pub fn read_commit(&self, id: &ObjectId) -> Commit {
        self.stores.objects.read_commit(id).unwrap()
    }

    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.service
            .get_file(&self.user(), CHANGE, path)
            .unwrap()
            .map(|(content, _)| content)
    }

    pub fn open(&self) -> chedit_edit::Repository {
        self.repos.open(PROJECT).unwrap()
    }
}
