//! Recursive flattening of an element subtree into a [`FlatRecord`].

use crate::models::record::FlatRecord;

use super::tree::XmlElement;

/// Flatten the children of `element` into a new record.
///
/// Keys are the local names of the elements on the path from `element`
/// (exclusive) down to each leaf, joined with `/` and prefixed with
/// `parent_path` when it is non-empty. Leaves that share a path overwrite
/// each other: the last one in document order wins.
pub fn flatten(element: &XmlElement, parent_path: &str) -> FlatRecord {
    let mut record = FlatRecord::new();
    flatten_into(element, parent_path, &mut record);
    record
}

/// Flatten the children of `element` into an existing record.
pub fn flatten_into(element: &XmlElement, parent_path: &str, record: &mut FlatRecord) {
    for child in element.children() {
        let path = child_path(parent_path, child.local_name());

        if child.is_leaf() {
            record.insert(path, child.text().map(str::to_string));
        } else {
            flatten_into(child, &path, record);
        }
    }
}

fn child_path(parent_path: &str, tag: &str) -> String {
    if parent_path.is_empty() {
        tag.to_string()
    } else {
        format!("{}/{}", parent_path, tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(xml: &str) -> XmlElement {
        XmlElement::parse_str(xml).unwrap()
    }

    fn count_leaves(element: &XmlElement) -> usize {
        element
            .children()
            .iter()
            .map(|c| if c.is_leaf() { 1 } else { count_leaves(c) })
            .sum()
    }

    #[test]
    fn test_builds_nested_paths() {
        let header = parse(
            r#"<FatturaElettronicaHeader>
                 <CedentePrestatore>
                   <Sede><Comune>Roma</Comune><CAP>00100</CAP></Sede>
                 </CedentePrestatore>
               </FatturaElettronicaHeader>"#,
        );

        let record = flatten(&header, "");

        assert_eq!(
            record.keys().collect::<Vec<_>>(),
            vec!["CedentePrestatore/Sede/Comune", "CedentePrestatore/Sede/CAP"]
        );
        assert_eq!(record.get("CedentePrestatore/Sede/Comune"), Some("Roma"));
    }

    #[test]
    fn test_strips_namespace_prefixes() {
        let header = parse(
            r#"<h:Header xmlns:h="urn:h" xmlns:c="urn:c">
                 <c:CedentePrestatore><c:Sede><c:Comune>Milano</c:Comune></c:Sede></c:CedentePrestatore>
               </h:Header>"#,
        );

        let record = flatten(&header, "");
        assert_eq!(record.get("CedentePrestatore/Sede/Comune"), Some("Milano"));
    }

    #[test]
    fn test_parent_path_prefix() {
        let line = parse("<DettaglioLinee><Descrizione>A</Descrizione></DettaglioLinee>");

        let record = flatten(&line, "Linea");
        assert_eq!(record.get("Linea/Descrizione"), Some("A"));
    }

    #[test]
    fn test_key_count_matches_leaf_count() {
        let doc = parse(
            r#"<Root>
                 <A><B>1</B><C>2</C></A>
                 <D>3</D>
                 <E><F><G>4</G></F><H/></E>
               </Root>"#,
        );

        let record = flatten(&doc, "");
        assert_eq!(record.len(), count_leaves(&doc));
        assert_eq!(record.len(), 5);
        assert!(record.is_null("E/H"));
    }

    #[test]
    fn test_repeated_leaf_last_wins() {
        let doc = parse(
            r#"<DatiGeneraliDocumento>
                 <Causale>prima</Causale>
                 <Causale>seconda</Causale>
               </DatiGeneraliDocumento>"#,
        );

        let record = flatten(&doc, "");
        assert_eq!(record.len(), 1);
        assert_eq!(record.get("Causale"), Some("seconda"));
    }

    #[test]
    fn test_flatten_into_merges_subtrees() {
        let doc = parse(
            r#"<DatiBeniServizi>
                 <DatiRiepilogo><AliquotaIVA>22.00</AliquotaIVA><Imposta>22.00</Imposta></DatiRiepilogo>
                 <DatiRiepilogo><AliquotaIVA>10.00</AliquotaIVA></DatiRiepilogo>
               </DatiBeniServizi>"#,
        );

        let mut record = FlatRecord::new();
        for summary in doc.find_all("DatiRiepilogo") {
            flatten_into(summary, "", &mut record);
        }

        assert_eq!(record.get("AliquotaIVA"), Some("10.00"));
        assert_eq!(record.get("Imposta"), Some("22.00"));
    }

    #[test]
    fn test_leaf_element_yields_nothing() {
        let doc = parse("<Numero>1</Numero>");
        assert!(flatten(&doc, "").is_empty());
    }

    #[test]
    fn test_whitespace_only_leaf_is_kept() {
        let general = parse("<DatiGeneraliDocumento><Causale>  </Causale><Numero>1</Numero></DatiGeneraliDocumento>");

        let record = flatten(&general, "");
        assert_eq!(record.get("Causale"), Some("  "));
        assert_eq!(record.get("Numero"), Some("1"));
    }
}
