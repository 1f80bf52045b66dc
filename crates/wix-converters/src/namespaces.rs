//! WiX namespaces, the v3 → v4 namespace registry, and the cascade that
//! retargets a subtree when one of its declarations is rewritten.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use wix_xml::{Attribute, Document, NodeId};

use crate::diagnostics::{DiagnosticCode, Reporter};

pub const WXS: &str = "http://wixtoolset.org/schemas/v4/wxs";
pub const WXL: &str = "http://wixtoolset.org/schemas/v4/wxl";
pub const BAL: &str = "http://wixtoolset.org/schemas/v4/wxs/bal";
pub const COMPLUS: &str = "http://wixtoolset.org/schemas/v4/wxs/complus";
pub const DIFXAPP: &str = "http://wixtoolset.org/schemas/v4/wxs/difxapp";
pub const DIRECTX: &str = "http://wixtoolset.org/schemas/v4/wxs/directx";
pub const FIREWALL: &str = "http://wixtoolset.org/schemas/v4/wxs/firewall";
pub const GAMING: &str = "http://wixtoolset.org/schemas/v4/wxs/gaming";
pub const HTTP: &str = "http://wixtoolset.org/schemas/v4/wxs/http";
pub const IIS: &str = "http://wixtoolset.org/schemas/v4/wxs/iis";
pub const MSMQ: &str = "http://wixtoolset.org/schemas/v4/wxs/msmq";
pub const NETFX: &str = "http://wixtoolset.org/schemas/v4/wxs/netfx";
pub const POWERSHELL: &str = "http://wixtoolset.org/schemas/v4/wxs/powershell";
pub const SQL: &str = "http://wixtoolset.org/schemas/v4/wxs/sql";
pub const TAG: &str = "http://wixtoolset.org/schemas/v4/wxs/tag";
pub const UI: &str = "http://wixtoolset.org/schemas/v4/wxs/ui";
pub const UTIL: &str = "http://wixtoolset.org/schemas/v4/wxs/util";
pub const VS: &str = "http://wixtoolset.org/schemas/v4/wxs/vs";

pub const WXS_V3: &str = "http://schemas.microsoft.com/wix/2006/wi";
pub const WXL_V3: &str = "http://schemas.microsoft.com/wix/2006/localization";

/// Deprecated namespace → replacement. `None` means the names move to no
/// namespace and the declaration goes away.
pub static DEPRECATED_NAMESPACES: Lazy<HashMap<&'static str, Option<&'static str>>> =
    Lazy::new(|| {
        HashMap::from([
            (WXS_V3, Some(WXS)),
            (WXL_V3, Some(WXL)),
            ("http://schemas.microsoft.com/wix/BalExtension", Some(BAL)),
            ("http://schemas.microsoft.com/wix/ComPlusExtension", Some(COMPLUS)),
            ("http://schemas.microsoft.com/wix/DependencyExtension", Some(WXS)),
            ("http://schemas.microsoft.com/wix/DifxAppExtension", Some(DIFXAPP)),
            ("http://schemas.microsoft.com/wix/DirectXExtension", Some(DIRECTX)),
            ("http://schemas.microsoft.com/wix/FirewallExtension", Some(FIREWALL)),
            ("http://schemas.microsoft.com/wix/GamingExtension", Some(GAMING)),
            ("http://schemas.microsoft.com/wix/HttpExtension", Some(HTTP)),
            ("http://schemas.microsoft.com/wix/IIsExtension", Some(IIS)),
            ("http://schemas.microsoft.com/wix/MsmqExtension", Some(MSMQ)),
            ("http://schemas.microsoft.com/wix/NetFxExtension", Some(NETFX)),
            ("http://schemas.microsoft.com/wix/PSExtension", Some(POWERSHELL)),
            ("http://schemas.microsoft.com/wix/SqlExtension", Some(SQL)),
            ("http://schemas.microsoft.com/wix/TagExtension", Some(TAG)),
            ("http://schemas.microsoft.com/wix/UIExtension", Some(UI)),
            ("http://schemas.microsoft.com/wix/UtilExtension", Some(UTIL)),
            ("http://schemas.microsoft.com/wix/VSExtension", Some(VS)),
            ("http://schemas.microsoft.com/wix/2006/WixUnit", None),
        ])
    });

/// The replacement for a deprecated namespace, or `None` when `namespace` is
/// current (or unknown).
pub fn replacement_for(namespace: &str) -> Option<Option<&'static str>> {
    DEPRECATED_NAMESPACES.get(namespace).copied()
}

/// Schema generation of the document being converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceVersion {
    Unknown,
    V3,
    V4,
}

impl SourceVersion {
    /// Infer the version from the root element.
    pub fn detect(doc: &Document) -> Self {
        let Some(root) = doc.root_element().and_then(|r| doc.element(r)) else {
            return SourceVersion::Unknown;
        };
        match root.name.namespace() {
            Some(WXS_V3 | WXL_V3) => SourceVersion::V3,
            None if root.name.local == "Wix" => SourceVersion::V3,
            Some(WXS | WXL) => SourceVersion::V4,
            _ => SourceVersion::Unknown,
        }
    }
}

/// Move every element and non-declaration attribute under `scope` (inclusive)
/// from namespace `from` to `to`. Returns how many names changed.
pub fn cascade(doc: &mut Document, scope: NodeId, from: &str, to: Option<&str>) -> usize {
    let mut changed = 0;
    for id in doc.descendants_and_self(scope) {
        let Some(element) = doc.element_mut(id) else {
            continue;
        };
        if element.name.namespace() == Some(from) {
            element.name.namespace = to.map(str::to_string);
            if to.is_none() {
                element.prefix = None;
            }
            changed += 1;
        }
        for attribute in element
            .attributes
            .iter_mut()
            .filter(|a| !a.is_namespace_declaration())
        {
            if attribute.name.namespace() == Some(from) {
                attribute.name.namespace = to.map(str::to_string);
                if to.is_none() {
                    attribute.prefix = None;
                }
                changed += 1;
            }
        }
    }
    changed
}

/// Rewrite the deprecated namespace declarations of `element`, cascading each
/// distinct deprecated namespace over the element's subtree once.
pub fn convert_declarations(doc: &mut Document, reporter: &mut Reporter<'_>, element: NodeId) {
    let Some(el) = doc.element(element) else {
        return;
    };

    let mut deprecated: Vec<(String, Option<&'static str>)> = Vec::new();
    for decl in el.namespace_declarations() {
        if let Some(target) = replacement_for(&decl.value) {
            if !deprecated.iter().any(|(ns, _)| *ns == decl.value) {
                deprecated.push((decl.value.clone(), target));
            }
        }
    }
    let line = doc.line(element);

    for (old, new) in deprecated {
        let message = match new {
            Some(new) => format!(
                "The namespace '{}' is out of date. It must be '{}'.",
                old, new
            ),
            None => format!(
                "The namespace '{}' is obsolete and will be removed.",
                old
            ),
        };
        if !reporter.report(DiagnosticCode::XmlnsValueWrong, Some(line), message) {
            continue;
        }

        let changed = cascade(doc, element, &old, new);
        tracing::debug!(from = %old, to = ?new, changed, "Cascaded namespace");

        if let Some(el) = doc.element_mut(element) {
            match new {
                Some(new) => {
                    for decl in el
                        .attributes
                        .iter_mut()
                        .filter(|a| a.is_namespace_declaration() && a.value == old)
                    {
                        decl.value = new.to_string();
                    }
                }
                None => el
                    .attributes
                    .retain(|a| !(a.is_namespace_declaration() && a.value == old)),
            }
        }
    }
}

/// Make sure `namespace` is declared on the root element, adding
/// `xmlns:prefix` when it is not. A taken prefix gets a numeric suffix.
pub fn ensure_root_declaration(doc: &mut Document, prefix: &str, namespace: &str) {
    let Some(root) = doc.root_element() else {
        return;
    };
    let Some(el) = doc.element_mut(root) else {
        return;
    };
    if el
        .namespace_declarations()
        .any(|d| d.value == namespace && !d.is_default_namespace_declaration())
        || el.name.namespace() == Some(namespace)
    {
        return;
    }

    let taken = |p: &str| el.namespace_declarations().any(|d| d.declared_prefix() == Some(p));
    let chosen = if taken(prefix) {
        (1..)
            .map(|n| format!("{}{}", prefix, n))
            .find(|p| !taken(p.as_str()))
            .unwrap_or_else(|| prefix.to_string())
    } else {
        prefix.to_string()
    };
    el.attributes
        .push(Attribute::namespace_declaration(Some(&chosen), namespace));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Mode;
    use crate::options::ConverterOptions;
    use wix_xml::{parse, to_xml_string};

    #[test]
    fn test_registry() {
        assert_eq!(replacement_for(WXS_V3), Some(Some(WXS)));
        assert_eq!(
            replacement_for("http://schemas.microsoft.com/wix/2006/WixUnit"),
            Some(None)
        );
        assert_eq!(replacement_for(WXS), None);
    }

    #[test]
    fn test_source_version() {
        let v3 = parse(r#"<Wix xmlns="http://schemas.microsoft.com/wix/2006/wi"/>"#).unwrap();
        let bare = parse("<Wix/>").unwrap();
        let v4 = parse(r#"<Wix xmlns="http://wixtoolset.org/schemas/v4/wxs"/>"#).unwrap();
        let other = parse("<Project/>").unwrap();
        assert_eq!(SourceVersion::detect(&v3), SourceVersion::V3);
        assert_eq!(SourceVersion::detect(&bare), SourceVersion::V3);
        assert_eq!(SourceVersion::detect(&v4), SourceVersion::V4);
        assert_eq!(SourceVersion::detect(&other), SourceVersion::Unknown);
    }

    #[test]
    fn test_cascade_leaves_unrelated_namespaces() {
        let mut doc = parse(
            r#"<Wix xmlns="urn:core"><F xmlns:dep="urn:old"><dep:Provides dep:Key="k"/></F><G xmlns:u="urn:util"><u:User/></G></Wix>"#,
        )
        .unwrap();
        let root = doc.root_element().unwrap();
        let f = doc.element_children(root)[0];
        assert_eq!(cascade(&mut doc, f, "urn:old", Some("urn:core")), 2);

        let g = doc.element_children(root)[1];
        let user = doc.element_children(g)[0];
        assert!(doc.is_element_named(user, Some("urn:util"), "User"));
    }

    #[test]
    fn test_convert_declarations_rewrites_values() {
        let options = ConverterOptions::default();
        let mut reporter = Reporter::new(Mode::Convert, "t.wxs", &options);
        let mut doc = parse(
            r#"<Wix xmlns="http://schemas.microsoft.com/wix/2006/wi" xmlns:util="http://schemas.microsoft.com/wix/UtilExtension"><util:User Id="u"/></Wix>"#,
        )
        .unwrap();
        let root = doc.root_element().unwrap();
        convert_declarations(&mut doc, &mut reporter, root);

        assert_eq!(reporter.count(), 2);
        assert!(doc.is_element_named(root, Some(WXS), "Wix"));
        assert_eq!(
            to_xml_string(&doc),
            r#"<Wix xmlns="http://wixtoolset.org/schemas/v4/wxs" xmlns:util="http://wixtoolset.org/schemas/v4/wxs/util"><util:User Id="u"/></Wix>"#
        );
    }

    #[test]
    fn test_obsolete_namespace_is_dropped() {
        let options = ConverterOptions::default();
        let mut reporter = Reporter::new(Mode::Convert, "t.wxs", &options);
        let mut doc =
            parse(r#"<WixUnit xmlns="http://schemas.microsoft.com/wix/2006/WixUnit"><Test/></WixUnit>"#)
                .unwrap();
        let root = doc.root_element().unwrap();
        convert_declarations(&mut doc, &mut reporter, root);
        assert_eq!(to_xml_string(&doc), "<WixUnit><Test/></WixUnit>");
    }

    #[test]
    fn test_ignored_code_leaves_declarations() {
        let options = ConverterOptions::default().with_ignored([DiagnosticCode::XmlnsValueWrong]);
        let mut reporter = Reporter::new(Mode::Convert, "t.wxs", &options);
        let source = r#"<Wix xmlns="http://schemas.microsoft.com/wix/2006/wi"/>"#;
        let mut doc = parse(source).unwrap();
        let root = doc.root_element().unwrap();
        convert_declarations(&mut doc, &mut reporter, root);
        assert_eq!(to_xml_string(&doc), source);
    }

    #[test]
    fn test_ensure_root_declaration() {
        let mut doc = parse(r#"<Wix xmlns="http://wixtoolset.org/schemas/v4/wxs" xmlns:bal="urn:other"/>"#).unwrap();
        ensure_root_declaration(&mut doc, "bal", BAL);
        ensure_root_declaration(&mut doc, "bal", BAL);
        ensure_root_declaration(&mut doc, "wix", WXS);
        assert_eq!(
            to_xml_string(&doc),
            r#"<Wix xmlns="http://wixtoolset.org/schemas/v4/wxs" xmlns:bal="urn:other" xmlns:bal1="http://wixtoolset.org/schemas/v4/wxs/bal"/>"#
        );
    }
}
