//! Patches a placed fragment's section bytes with the addresses its
//! fixups reference, now that every name has one.

use std::collections::BTreeMap;

use toy_store::{Fragment, IFixup, SectionType, XFixup};

use crate::eligible::EligibleFragment;
use crate::error::LinkError;

/// Patches one section's bytes in place. `own_name`/`own_fragment` identify
/// the fragment the section belongs to, needed to resolve internal fixups'
/// `name/section` keys. Returns a fresh buffer the same length as `data` —
/// the patch format (two hex characters) never changes a section's size.
pub fn apply_fixups(
    data: &[u8],
    xfixups: &[XFixup],
    ifixups: &[IFixup],
    own_name: &str,
    own_fragment: &Fragment,
    eligible: &BTreeMap<String, EligibleFragment>,
    name_address: &BTreeMap<String, u64>,
    section_base: &BTreeMap<SectionType, u64>,
) -> Result<Vec<u8>, LinkError> {
    let mut bytes = data.to_vec();

    for x in xfixups {
        if x.offset < 0 {
            // Pointer-only sentinel: the dependency already ordered the
            // layout; no byte in this section encodes it.
            continue;
        }
        let referent = eligible.get(&x.name).ok_or_else(|| LinkError::UndefinedReference(x.name.clone()))?;
        let base_address = *name_address
            .get(&x.name)
            .ok_or_else(|| LinkError::UndefinedReference(x.name.clone()))?;
        let base = *section_base.get(&referent.fragment.primary).unwrap_or(&0);
        patch(&mut bytes, x.offset as usize, base_address + base, &x.name)?;
    }

    for f in ifixups {
        if f.offset < 0 {
            continue;
        }
        let key = if f.section == own_fragment.primary {
            own_name.to_string()
        } else {
            format!("{own_name}/{}", f.section.name())
        };
        let address = *name_address.get(&key).ok_or_else(|| LinkError::UndefinedReference(key.clone()))?;
        let base = *section_base.get(&f.section).unwrap_or(&0);
        patch(&mut bytes, f.offset as usize, address + base, own_name)?;
    }

    Ok(bytes)
}

/// Writes the low byte of `address`, as two lowercase hex characters, into
/// `bytes[offset..offset + 2]` — the toy machine's only patchable width
/// (distilled spec §4.6 / §9's patch-width note).
fn patch(bytes: &mut [u8], offset: usize, address: u64, name: &str) -> Result<(), LinkError> {
    let hex = format!("{:02x}", (address & 0xff) as u8);
    let patch_bytes = hex.as_bytes();
    if offset + patch_bytes.len() > bytes.len() {
        return Err(LinkError::FixupOutOfBounds {
            name: name.to_string(),
            offset: offset as i64,
        });
    }
    bytes[offset..offset + patch_bytes.len()].copy_from_slice(patch_bytes);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use toy_store::Fragment as Frag;

    #[test]
    fn negative_offset_patches_nothing_and_preserves_length() {
        let data = vec![b'?', b'?'];
        let xfixups = vec![XFixup { offset: -1, name: "f".into() }];
        let own = Frag::text_only(data.clone());
        let eligible = BTreeMap::new();
        let name_address = BTreeMap::new();
        let base = BTreeMap::new();

        let patched = apply_fixups(&data, &xfixups, &[], "main", &own, &eligible, &name_address, &base).unwrap();
        assert_eq!(patched, data);
    }

    #[test]
    fn scenario_patches_low_byte_as_two_hex_chars() {
        // Distilled spec §8 scenario 3: offset 2 patched with hex(0x00) == "00".
        let data = vec![b'.', b'.', b'?', b'?'];
        let xfixups = vec![XFixup { offset: 2, name: "f".into() }];
        let own = Frag::text_only(data.clone());

        let mut eligible = BTreeMap::new();
        eligible.insert(
            "f".to_string(),
            EligibleFragment {
                digest: "df".into(),
                fragment: Frag::text_only(vec![0, 0]),
                line_base: None,
            },
        );
        let mut name_address = BTreeMap::new();
        name_address.insert("f".to_string(), 0u64);
        let mut base = BTreeMap::new();
        base.insert(SectionType::Text, 0u64);

        let patched = apply_fixups(&data, &xfixups, &[], "main", &own, &eligible, &name_address, &base).unwrap();
        assert_eq!(patched.len(), data.len());
        assert_eq!(&patched[2..4], b"00");
    }

    #[test]
    fn out_of_bounds_offset_is_rejected() {
        let data = vec![b'?'];
        let xfixups = vec![XFixup { offset: 5, name: "f".into() }];
        let own = Frag::text_only(data.clone());
        let mut eligible = BTreeMap::new();
        eligible.insert(
            "f".to_string(),
            EligibleFragment {
                digest: "df".into(),
                fragment: Frag::text_only(vec![0]),
                line_base: None,
            },
        );
        let mut name_address = BTreeMap::new();
        name_address.insert("f".to_string(), 0u64);
        let base = BTreeMap::new();

        let err = apply_fixups(&data, &xfixups, &[], "main", &own, &eligible, &name_address, &base).unwrap_err();
        assert!(matches!(err, LinkError::FixupOutOfBounds { .. }));
    }
}
