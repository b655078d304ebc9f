/*!
 * Tests for vocabulary word list loading
 */

use std::sync::Arc;
use anyhow::Result;

use cineseed::database::models::VocabularyCategory;
use cineseed::database::SeedStore;
use cineseed::vocabulary::{discover_word_lists, parse_word_list, VocabularyLoader, VocabularyReport};
use crate::common;
use crate::common::memory_store::MemoryStore;

/// Test parsing a word list with mixed formats
#[test]
fn test_parseWordList_withMixedLines_shouldCountRejected() {
    let content = "\u{feff}1. abandon 버리다\n\nbenefit 이익\n   \n???\n2. co-op 협동조합\n";

    let parsed = parse_word_list(content);

    assert_eq!(
        parsed.words,
        vec![
            ("abandon".to_string(), "버리다".to_string()),
            ("benefit".to_string(), "이익".to_string()),
        ]
    );
    assert_eq!(parsed.rejected, 2);
}

/// Test discovering word lists per category directory
#[test]
fn test_discoverWordLists_shouldMapDirectoriesToCategories() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = common::create_vocabulary_dir(temp_dir.path())?;
    common::create_test_file(&root, "notes.txt", "stray 파일\n")?;
    common::create_test_file(&root, "gre/gre.txt", "abate 줄다\n")?;
    common::create_test_file(&root, "toeic/readme.md", "not a list\n")?;

    let lists = discover_word_lists(&root)?;

    let categories: Vec<VocabularyCategory> = lists.iter().map(|list| list.category).collect();
    assert_eq!(categories.len(), 4);
    for category in VocabularyCategory::ALL {
        assert!(categories.contains(&category), "missing {}", category);
    }
    assert!(lists.iter().all(|list| list.path.extension().unwrap() == "txt"));
    Ok(())
}

/// Test loading a vocabulary directory into a store
#[tokio::test]
async fn test_loadDirectory_shouldInsertEveryCategory() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = common::create_vocabulary_dir(temp_dir.path())?;
    let store = Arc::new(MemoryStore::new());
    let loader = VocabularyLoader::new(store.clone());

    let report = loader.load_directory(&root).await?;

    assert_eq!(
        report,
        VocabularyReport { files: 4, inserted: 9, existing: 0, rejected: 1 }
    );
    assert!(store.find_vocabulary_word("ephemeral", VocabularyCategory::Sat).await?.is_some());
    assert!(store.find_vocabulary_word("ephemeral", VocabularyCategory::Toeic).await?.is_none());
    Ok(())
}

/// Test that loading twice leaves the store unchanged
#[tokio::test]
async fn test_loadDirectory_twice_shouldSkipExistingWords() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = common::create_vocabulary_dir(temp_dir.path())?;
    let store = Arc::new(MemoryStore::new());
    let loader = VocabularyLoader::new(store.clone());

    loader.load_directory(&root).await?;
    let second = loader.load_directory(&root).await?;

    assert_eq!(second.inserted, 0);
    assert_eq!(second.existing, 9);
    assert_eq!(store.list_vocabulary().await?.len(), 9);
    Ok(())
}

/// Test that the same word may exist once per category
#[tokio::test]
async fn test_loadWords_sameWordTwoCategories_shouldKeepBoth() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    let loader = VocabularyLoader::new(store.clone());

    loader.load_words("1. deadline 마감\n", VocabularyCategory::Toeic).await?;
    let report = loader.load_words("deadline 기한\ndeadline 마감일\n", VocabularyCategory::Business).await?;

    assert_eq!(report.inserted, 1);
    assert_eq!(report.existing, 1);
    assert_eq!(store.list_vocabulary().await?.len(), 2);
    Ok(())
}

/// Test that a missing directory yields an empty report
#[tokio::test]
async fn test_loadDirectory_withMissingDirectory_shouldReturnEmptyReport() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let loader = VocabularyLoader::new(Arc::new(MemoryStore::new()));

    let report = loader.load_directory(temp_dir.path().join("absent")).await?;

    assert_eq!(report, VocabularyReport::default());
    Ok(())
}
