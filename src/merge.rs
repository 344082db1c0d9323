use crate::filter::{self, FilterMode};
use crate::results::MergeResult;
use lopdf::{Document, Object, ObjectId};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Merges the given PDFs, in order, into a single document at `output`.
///
/// Best-effort over imperfect inputs: encrypted and unreadable files are
/// skipped with a warning and the rest still merge. Only when no pages at all
/// survive does the merge fail. With `delete_originals` set, the files whose
/// pages made it into the output are removed afterwards; skipped files are
/// left alone.
pub fn merge_files(inputs: &[PathBuf], output: &Path, delete_originals: bool) -> MergeResult {
    let inputs: Vec<PathBuf> = inputs
        .iter()
        .filter(|path| {
            let keep = path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
            if !keep {
                ::log::warn!("ignoring non-pdf input: {}", path.display());
            }
            keep
        })
        .cloned()
        .collect();
    if inputs.is_empty() {
        return MergeResult::failure("no pdf input files to merge");
    }

    let mut max_id = 1;
    let mut documents_pages: BTreeMap<ObjectId, Object> = BTreeMap::new();
    let mut documents_objects: BTreeMap<ObjectId, Object> = BTreeMap::new();
    let mut merged_inputs: Vec<PathBuf> = Vec::new();

    for path in &inputs {
        let mut doc = match Document::load(path) {
            Ok(doc) => doc,
            Err(e) => {
                ::log::warn!("skipping unreadable pdf {}: {}", path.display(), e);
                continue;
            }
        };
        if doc.is_encrypted() {
            ::log::warn!("skipping encrypted pdf: {}", path.display());
            continue;
        }

        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        let mut pages: BTreeMap<ObjectId, Object> = BTreeMap::new();
        for (_, object_id) in doc.get_pages() {
            if let Ok(object) = doc.get_object(object_id) {
                pages.insert(object_id, object.to_owned());
            }
        }
        if pages.is_empty() {
            ::log::warn!("skipping pdf without pages: {}", path.display());
            continue;
        }

        documents_pages.extend(pages);
        documents_objects.extend(doc.objects);
        merged_inputs.push(path.clone());
    }

    if documents_pages.is_empty() {
        return MergeResult::failure("no pages to merge");
    }

    let mut document = Document::with_version("1.5");

    // Fold all source catalogs and page trees into one of each; everything
    // else carries over untouched
    let mut catalog_object: Option<(ObjectId, Object)> = None;
    let mut pages_object: Option<(ObjectId, Object)> = None;

    for (object_id, object) in documents_objects.iter() {
        match object.type_name().unwrap_or("") {
            "Catalog" => {
                catalog_object = Some((
                    catalog_object.map(|(id, _)| id).unwrap_or(*object_id),
                    object.clone(),
                ));
            }
            "Pages" => {
                if let Ok(dictionary) = object.as_dict() {
                    let mut dictionary = dictionary.clone();
                    if let Some((_, ref object)) = pages_object {
                        if let Ok(old_dictionary) = object.as_dict() {
                            dictionary.extend(old_dictionary);
                        }
                    }
                    pages_object = Some((
                        pages_object.map(|(id, _)| id).unwrap_or(*object_id),
                        Object::Dictionary(dictionary),
                    ));
                }
            }
            // Page objects are re-parented below; outlines are dropped
            "Page" => {}
            "Outlines" => {}
            "Outline" => {}
            _ => {
                document.objects.insert(*object_id, object.clone());
            }
        }
    }

    let Some(pages_object) = pages_object else {
        return MergeResult::failure("merged documents contain no page tree");
    };
    let Some(catalog_object) = catalog_object else {
        return MergeResult::failure("merged documents contain no catalog");
    };

    for (object_id, object) in documents_pages.iter() {
        if let Ok(dictionary) = object.as_dict() {
            let mut dictionary = dictionary.clone();
            dictionary.set("Parent", pages_object.0);
            document
                .objects
                .insert(*object_id, Object::Dictionary(dictionary));
        }
    }

    if let Ok(dictionary) = pages_object.1.as_dict() {
        let mut dictionary = dictionary.clone();
        dictionary.set("Count", documents_pages.len() as u32);
        dictionary.set(
            "Kids",
            documents_pages
                .keys()
                .map(|object_id| Object::Reference(*object_id))
                .collect::<Vec<_>>(),
        );
        document
            .objects
            .insert(pages_object.0, Object::Dictionary(dictionary));
    }

    if let Ok(dictionary) = catalog_object.1.as_dict() {
        let mut dictionary = dictionary.clone();
        dictionary.set("Pages", pages_object.0);
        dictionary.remove(b"Outlines");
        document
            .objects
            .insert(catalog_object.0, Object::Dictionary(dictionary));
    }

    document.trailer.set("Root", catalog_object.0);
    document.max_id = document.objects.len() as u32;
    document.renumber_objects();
    document.compress();

    if let Err(e) = document.save(output) {
        return MergeResult::failure(format!("could not save {}: {e}", output.display()));
    }

    let size = std::fs::metadata(output).map(|m| m.len()).unwrap_or(0);
    ::log::info!(
        "merged {} file(s), {} page(s) into {}",
        merged_inputs.len(),
        documents_pages.len(),
        output.display()
    );

    let mut deleted_files = Vec::new();
    if delete_originals {
        for path in &merged_inputs {
            if path == output {
                continue;
            }
            match std::fs::remove_file(path) {
                Ok(()) => deleted_files.push(path.clone()),
                Err(e) => ::log::warn!("could not delete {}: {}", path.display(), e),
            }
        }
    }

    MergeResult {
        success: true,
        output_file: Some(output.to_path_buf()),
        total_pages: documents_pages.len(),
        files_merged: merged_inputs.len(),
        output_size_mb: size as f64 / (1024.0 * 1024.0),
        deleted_originals: !deleted_files.is_empty(),
        deleted_files,
        error: None,
    }
}

/// Merges every `.pdf` under `dir` (recursively, so per-host download
/// subdirectories are included) whose filename passes the filter, in sorted
/// path order, into `dir/<output_name>`. An existing file of that name is
/// never taken as an input to its own merge.
pub fn merge_directory(
    dir: &Path,
    output_name: &str,
    mode: FilterMode,
    keywords: &[String],
    delete_originals: bool,
) -> MergeResult {
    if !dir.is_dir() {
        return MergeResult::failure(format!("could not read {}", dir.display()));
    }

    let output = dir.join(output_name);
    let mut files: Vec<PathBuf> = Vec::new();
    collect_pdf_files(dir, &output, mode, keywords, &mut files);

    if files.is_empty() {
        return MergeResult::failure(format!(
            "no matching pdf files in {}",
            dir.display()
        ));
    }
    files.sort();

    ::log::info!("merging {} file(s) from {}", files.len(), dir.display());
    merge_files(&files, &output, delete_originals)
}

/// Recursive `*.pdf` collection; unreadable subdirectories are logged and
/// skipped
fn collect_pdf_files(
    dir: &Path,
    output: &Path,
    mode: FilterMode,
    keywords: &[String],
    files: &mut Vec<PathBuf>,
) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            ::log::warn!("could not read {}: {}", dir.display(), e);
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_pdf_files(&path, output, mode, keywords, files);
            continue;
        }
        if path == output {
            continue;
        }
        if !path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
        {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if filter::matches_filename(name, mode, keywords) {
            files.push(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_fails() {
        let result = merge_files(&[], Path::new("/tmp/out.pdf"), false);
        assert!(!result.success);
        assert_eq!(result.total_pages, 0);
        assert!(result.error.is_some());
    }

    #[test]
    fn test_all_unreadable_inputs_fail_with_zero_pages() {
        let dir = tempfile::tempdir().expect("tempdir");
        let bogus = dir.path().join("bogus.pdf");
        std::fs::write(&bogus, b"not a pdf at all").expect("write");

        let result = merge_files(&[bogus], &dir.path().join("out.pdf"), false);
        assert!(!result.success);
        assert_eq!(result.files_merged, 0);
    }

    #[test]
    fn test_directory_without_matches_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("notes.txt"), b"x").expect("write");

        let result = merge_directory(dir.path(), "merged.pdf", FilterMode::All, &[], false);
        assert!(!result.success);
    }
}
