//! Link drawing between annotations (`Chain` and `All to all` modes).

use docanno_geometry::{Rect, is_intersected};

use crate::model::{Annotation, AnnotationLink, AnnotationPatch, BoundType, LinkType};

/// Link patches for every annotation touched by a link-mode drag.
///
/// Annotations whose bound intersects `rect` take part in list order.
/// `Chain` links each one to the next; `All to all` links every pair once,
/// from the earlier to the later one. Existing links to the same target are
/// kept and not duplicated. Returns one patch per annotation that gained links.
pub fn build_links(
    mode: BoundType,
    rect: &Rect,
    annotations: &[Annotation],
    page_num: u32,
    category: Option<&str>,
) -> Vec<AnnotationPatch> {
    let link_type = match mode {
        BoundType::Chain => LinkType::Chain,
        BoundType::AllToAll => LinkType::AllToAll,
        _ => return Vec::new(),
    };

    let members: Vec<&Annotation> = annotations
        .iter()
        .filter(|a| a.bound_type != BoundType::TableCell && is_intersected(&a.rect(), rect))
        .collect();
    if members.len() < 2 {
        return Vec::new();
    }

    let pairs: Vec<(usize, usize)> = match link_type {
        LinkType::Chain => (0..members.len() - 1).map(|i| (i, i + 1)).collect(),
        LinkType::AllToAll => (0..members.len())
            .flat_map(|i| (i + 1..members.len()).map(move |j| (i, j)))
            .collect(),
    };

    let mut patches: Vec<AnnotationPatch> = Vec::new();
    for (from, to) in pairs {
        let source = members[from];
        let target_id = members[to].id;

        let index = match patches.iter().position(|p| p.id == source.id) {
            Some(index) => index,
            None => {
                let mut patch = AnnotationPatch::new(source.id);
                patch.links = Some(source.links.clone());
                patches.push(patch);
                patches.len() - 1
            }
        };

        let links = patches[index].links.get_or_insert_with(Vec::new);
        if links.iter().any(|l| l.to == target_id) {
            continue;
        }
        links.push(AnnotationLink {
            to: target_id,
            page_num,
            link_type,
            category: category.map(str::to_string),
        });
    }

    patches.retain(|p| {
        let before = members
            .iter()
            .find(|a| a.id == p.id)
            .map_or(0, |a| a.links.len());
        p.links.as_ref().map_or(0, Vec::len) > before
    });

    log::debug!(
        "🔗 {} linking {} annotations -> {} updated",
        mode.name(),
        members.len(),
        patches.len()
    );
    patches
}
