use rivet_verify::{DiagnosticDetail, DiagnosticResult};

pub(crate) fn format_result_human(r: &DiagnosticResult) -> String {
    let mut out = format!(
        "{}[{}]: {}\n  --> {} ({})\n",
        r.severity, r.code, r.description, r.service, r.diagnosed.lifestyle,
    );

    out.push_str(&format!("   = hash: {}\n", r.fingerprint));

    match &r.detail {
        DiagnosticDetail::LifestyleMismatch { dependency } => {
            out.push_str(&format!(
                "   = fix: register {} as {} or longer, or take it as a lazy dependency\n",
                dependency.service, r.diagnosed.lifestyle,
            ));
        }
        DiagnosticDetail::TornLifestyle { implementation, .. } => {
            out.push_str(&format!(
                "   = fix: register {} once for all of its services\n",
                implementation
            ));
        }
        DiagnosticDetail::ShortCircuitedDependency {
            expected_services,
            unregistered_dependencies,
            ..
        } => {
            if !expected_services.is_empty() {
                out.push_str(&format!("   = fix: depend on {}\n", expected_services.join(" or ")));
            }
            if !unregistered_dependencies.is_empty() {
                out.push_str(&format!(
                    "   = unregistered: {}\n",
                    unregistered_dependencies.join(", ")
                ));
            }
        }
        DiagnosticDetail::DisposableTransientComponent => {
            out.push_str("   = fix: use a scoped or singleton lifestyle\n");
        }
        DiagnosticDetail::AmbiguousLifestyles { lifestyles, .. } => {
            out.push_str(&format!("   = lifestyles: {}\n", lifestyles.join(", ")));
        }
        DiagnosticDetail::ContainerRegisteredCollection { element } => {
            out.push_str(&format!("   = collection: Vec<{}>\n", element));
        }
    }

    let others: Vec<String> = r
        .affected
        .iter()
        .filter(|a| a.key != r.diagnosed.key)
        .map(|a| format!("{} ({})", a.service, a.lifestyle))
        .collect();
    if !others.is_empty() {
        out.push_str(&format!("   = affected: {}\n", others.join(", ")));
    }

    out
}
