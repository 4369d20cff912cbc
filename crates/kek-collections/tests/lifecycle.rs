use std::sync::Arc;

use kek_collections::id::{COLLECTION_TAG, decode_id_time};
use kek_collections::{
    Collection, CollectionEngine, CollectionError, Doc, EngineConfig, ErrorKind, LoadOptions,
    NewCollection, RevisionStatus,
};
use kek_revchain::RevisionChain;
use kek_store::{MemStore, Storer, StorerExt};

mod helpers;
use helpers::{ids, mem_engine};

#[tokio::test]
async fn create_assigns_identity_and_normalizes_resources() {
    let (engine, _store) = mem_engine();
    let resources = ids(&[
        ("afasees", true),
        ("basdfe", true),
        ("cceasefe", false),
        ("ddeasse", true),
        ("cceasasdfefe", true),
    ]);
    let col = engine
        .create(
            NewCollection::named("my sample name")
                .description("a good description")
                .resources(resources),
        )
        .await
        .unwrap();

    assert!(col.id.starts_with(COLLECTION_TAG));
    let created_ms = decode_id_time(&col.id).expect("time-ordered id");
    assert!(created_ms > 0);

    for included in ["afasees", "basdfe", "ddeasse", "cceasasdfefe"] {
        assert!(col.includes(included), "missing {included}");
    }
    assert!(!col.resource_ids.contains_key("cceasefe"));
    assert!(col.resource_ids.values().all(|flag| *flag));

    assert_eq!(col.slug, "my-sample-name");
    assert!(!col.slug.contains(char::is_whitespace));
    assert!(!col.rev.is_empty());
    assert_eq!(col.created_at_ns, col.updated_at_ns);
}

#[tokio::test]
async fn create_writes_record_chain_and_slug_entry() {
    let (engine, store) = mem_engine();
    let col = engine.create(NewCollection::named("Notes")).await.unwrap();
    assert!(store.contains(&format!("c/{}", col.id)));
    assert!(store.contains(&format!("c/{}.kek", col.id)));
    assert!(store.contains(&format!("slugs/notes/{}", col.id)));

    let chain = engine.history(&col.id).await.unwrap();
    assert_eq!(chain.len(), 1);
    assert_eq!(chain.hash_string(), col.rev);
}

#[tokio::test]
async fn create_without_name_uses_random_slug() {
    let (engine, _store) = mem_engine();
    let col = engine.create(NewCollection::default()).await.unwrap();
    assert_eq!(col.slug.len(), engine.config().slug_seed_len);
    assert!(col.slug.chars().all(|c| c.is_ascii_alphanumeric()));
}

#[tokio::test]
async fn created_collection_round_trips() {
    let (engine, _store) = mem_engine();
    let created = engine
        .create(NewCollection::named("Round trip").resource("dd1", true))
        .await
        .unwrap();
    let loaded = engine
        .load_by_id(&created.id, LoadOptions::default())
        .await
        .unwrap();
    assert_eq!(loaded, created);
}

#[tokio::test]
async fn save_appends_revision_and_advances_time() {
    let (engine, _store) = mem_engine();
    let created = engine.create(NewCollection::named("Draft")).await.unwrap();

    let mut edited = engine
        .load_by_id(&created.id, LoadOptions::default())
        .await
        .unwrap();
    edited.description = "now with a description".into();
    let saved = engine.save(edited).await.unwrap();

    assert_ne!(saved.rev, created.rev);
    assert!(saved.updated_at_ns > created.updated_at_ns);
    assert_eq!(saved.created_at_ns, created.created_at_ns);

    let reloaded = engine
        .load_by_id(&created.id, LoadOptions::record_only())
        .await
        .unwrap();
    assert_eq!(reloaded.description, "now with a description");
    assert_eq!(reloaded.rev, saved.rev);

    let chain = engine.history(&created.id).await.unwrap();
    assert_eq!(chain.len(), 2);
    assert_eq!(chain.blocks[1].prev_hash, created.rev);
    let payload: Collection = chain.blocks[1].decode_payload().unwrap();
    assert_eq!(payload.description, "now with a description");
}

#[tokio::test]
async fn save_of_unknown_collection_is_not_found() {
    let (engine, store) = mem_engine();
    let unknown = Collection {
        id: "ccunknown".into(),
        name: "never created".into(),
        ..Collection::default()
    };
    let err = engine.save(unknown).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(!store.contains("c/ccunknown"));
}

#[tokio::test]
async fn save_without_chain_leaves_record_untouched() {
    let (engine, store) = mem_engine();
    let orphan = Collection {
        id: "ccorphan".into(),
        name: "no chain".into(),
        ..Collection::default()
    };
    store.save_record("c/ccorphan", &orphan).await.unwrap();

    let err = engine
        .save(Collection {
            description: "edited".into(),
            ..orphan.clone()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CollectionError::Chain { .. }));
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let stored: Collection = store.load_record("c/ccorphan").await.unwrap();
    assert_eq!(stored, orphan);
}

#[tokio::test]
async fn save_keeps_the_indexed_slug() {
    let (engine, store) = mem_engine();
    let alpha = engine.create(NewCollection::named("alpha")).await.unwrap();
    let beta = engine.create(NewCollection::named("beta")).await.unwrap();

    let saved = engine
        .save(Collection {
            slug: "alpha".into(),
            description: "renamed in place".into(),
            ..beta.clone()
        })
        .await
        .unwrap();
    assert_eq!(saved.slug, "beta");
    assert_eq!(saved.description, "renamed in place");

    let by_alpha = engine
        .load_by_slug("alpha", LoadOptions::default())
        .await
        .unwrap();
    assert_eq!(by_alpha.id, alpha.id);

    engine.delete(&beta.id, true).await.unwrap();
    assert_eq!(
        helpers::keys_under(&store, "slugs/"),
        vec![format!("slugs/alpha/{}", alpha.id)]
    );
    let still_there = engine
        .load_by_slug("alpha", LoadOptions::default())
        .await
        .unwrap();
    assert_eq!(still_there.id, alpha.id);
}

#[tokio::test]
async fn save_survives_the_largest_timestamp() {
    let (engine, _store) = mem_engine();
    let col = engine.create(NewCollection::named("Far Future")).await.unwrap();
    let saved = engine
        .save(Collection {
            updated_at_ns: u64::MAX,
            ..col
        })
        .await
        .unwrap();
    assert_eq!(saved.updated_at_ns, u64::MAX);
}

#[tokio::test]
async fn missing_collection_is_not_found() {
    let (engine, _store) = mem_engine();
    let err = engine
        .load_by_id("ccdoesnotexist", LoadOptions::full())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn load_with_revisions_attaches_chain() {
    let (engine, _store) = mem_engine();
    let col = engine.create(NewCollection::named("History")).await.unwrap();
    engine.add_resource(&col.id, "dd1").await.unwrap();

    let loaded = engine
        .load_by_id(
            &col.id,
            LoadOptions {
                with_revisions: true,
                ..LoadOptions::default()
            },
        )
        .await
        .unwrap();
    let chain = loaded.revisions.expect("revisions attached");
    assert_eq!(chain.len(), 2);
    assert_eq!(chain.hash_string(), loaded.rev);
    assert!(loaded.docs.is_empty(), "resources were not requested");
}

#[tokio::test]
async fn load_with_resources_hydrates_what_resolves() {
    let (engine, store) = mem_engine();
    let nested = engine.create(NewCollection::named("Nested")).await.unwrap();
    store
        .save_record("d/dd1", &Doc::Text("leaf document".into()))
        .await
        .unwrap();

    let parent = engine
        .create(
            NewCollection::named("Parent")
                .resource(nested.id.clone(), true)
                .resource("dd1", true)
                .resource("ddmissing", true)
                .resource("cc00000000000000000000000000000000", true)
                .resource("zzunknownkind", true),
        )
        .await
        .unwrap();

    let loaded = engine
        .load_by_id(
            &parent.id,
            LoadOptions {
                with_resources: true,
                ..LoadOptions::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(loaded.collections.len(), 1);
    assert_eq!(loaded.collections[&nested.id].name, "Nested");
    assert_eq!(loaded.docs.len(), 1);
    assert_eq!(loaded.docs["dd1"], Doc::Text("leaf document".into()));
    assert_eq!(loaded.resource_ids.len(), 5, "hydration never edits the map");
}

#[tokio::test]
async fn all_loads_every_collection_and_skips_chain_artifacts() {
    let (engine, store) = mem_engine();
    let mut created = Vec::new();
    for name in ["one", "two", "three"] {
        created.push(engine.create(NewCollection::named(name)).await.unwrap().id);
    }
    store.save("c/readme", b"not a collection".to_vec()).await.unwrap();

    let all = engine.all(LoadOptions::default()).await.unwrap();
    assert_eq!(all.len(), 3);
    for id in &created {
        assert_eq!(&all[id].id, id);
    }
}

#[tokio::test]
async fn all_fails_on_an_unreadable_record() {
    let (engine, store) = mem_engine();
    engine.create(NewCollection::named("fine")).await.unwrap();
    store.save("c/ccbroken", vec![0xff, 0x00, 0x13]).await.unwrap();

    let err = engine.all(LoadOptions::default()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Dependency);
}

#[tokio::test]
async fn verify_reports_a_record_behind_its_chain() {
    let (engine, _store) = mem_engine();
    let col = engine.create(NewCollection::named("Audit")).await.unwrap();
    assert_eq!(
        engine.verify(&col.id).await.unwrap(),
        RevisionStatus::InSync {
            rev: col.rev.clone(),
            blocks: 1
        }
    );

    let block = engine
        .chain()
        .add_block(&col.id, b"appended elsewhere".to_vec())
        .await
        .unwrap();
    assert_eq!(
        engine.verify(&col.id).await.unwrap(),
        RevisionStatus::RecordBehind {
            record_rev: col.rev,
            chain_rev: block.hash,
        }
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_get_distinct_ids() {
    let (engine, _store) = mem_engine();
    let creates = (0..16).map(|i| {
        let engine = engine.clone();
        tokio::spawn(async move { engine.create(NewCollection::named(format!("batch {i}"))).await })
    });
    let mut ids = std::collections::BTreeSet::new();
    for handle in futures::future::join_all(creates).await {
        let col = handle.unwrap().unwrap();
        assert!(ids.insert(col.id));
    }
    assert_eq!(engine.all(LoadOptions::default()).await.unwrap().len(), 16);
}

#[tokio::test]
async fn custom_prefix_drives_ids_hydration_and_listing() {
    let config = EngineConfig {
        id_prefix: "col".into(),
        ..EngineConfig::default()
    };
    let engine = CollectionEngine::open(Arc::new(MemStore::new()), config);

    let nested = engine.create(NewCollection::named("Inner")).await.unwrap();
    assert!(nested.id.starts_with("col"));
    let parent = engine
        .create(NewCollection::named("Outer").resource(nested.id.clone(), true))
        .await
        .unwrap();

    let loaded = engine
        .load_by_id(&parent.id, LoadOptions::full())
        .await
        .unwrap();
    assert_eq!(loaded.collections.len(), 1);
    assert_eq!(loaded.collections[&nested.id].name, "Inner");

    let all = engine.all(LoadOptions::default()).await.unwrap();
    assert_eq!(all.len(), 2);
    let by_slug = engine
        .load_by_slug("inner", LoadOptions::default())
        .await
        .unwrap();
    assert_eq!(by_slug.id, nested.id);
}
