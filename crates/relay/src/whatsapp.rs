use anyhow::{Context, Result};
use url::Url;

use pricebook_core::domain::service::Service;
use pricebook_core::pricing::evaluator::PriceBreakdown;
use pricebook_core::pricing::format::render_breakdown;

/// The prefilled message a customer sends to confirm a quote over
/// WhatsApp: a greeting naming the service, then the full breakdown.
pub fn handoff_message(service: &Service, breakdown: &PriceBreakdown) -> String {
    let mut lines = vec![format!("Hello! I would like to book {}.", service.name)];
    lines.extend(render_breakdown(breakdown));
    lines.join("\n")
}

/// Builds the wa.me deep link that opens a chat with the business number
/// and the quote prefilled. `phone` is digits only in international form.
pub fn quote_handoff_link(
    phone: &str,
    service: &Service,
    breakdown: &PriceBreakdown,
) -> Result<Url> {
    let mut link = Url::parse(&format!("https://wa.me/{phone}"))
        .with_context(|| format!("could not build wa.me link for phone `{phone}`"))?;
    link.query_pairs_mut().append_pair("text", &handoff_message(service, breakdown));
    Ok(link)
}

#[cfg(test)]
mod tests {
    use pricebook_core::domain::service::ServiceId;
    use pricebook_core::pricing::session::QuoteSession;
    use pricebook_core::pricing::table::Catalog;

    use super::{handoff_message, quote_handoff_link};

    #[test]
    fn handoff_link_targets_the_business_number_with_prefilled_text() {
        let catalog = Catalog::embedded();
        let mut session = QuoteSession::open(&catalog, &ServiceId("maid-service".to_string()))
            .expect("session opens");
        session.adjust_count("maids", 2);
        session.adjust_count("hours", 3);

        let link = quote_handoff_link("971501234567", session.service(), session.breakdown())
            .expect("link builds");

        assert_eq!(link.host_str(), Some("wa.me"));
        assert_eq!(link.path(), "/971501234567");

        let text = link
            .query_pairs()
            .find(|(key, _)| key == "text")
            .map(|(_, value)| value.into_owned())
            .expect("text query parameter present");
        assert!(text.starts_with("Hello! I would like to book Maid Service."));
        assert!(text.contains("Subtotal: AED 960.00"));
        assert!(text.contains("Volume discount (5%): -AED 48.00"));
        assert!(text.contains("Total: AED 912.00"));
    }

    #[test]
    fn message_lists_every_breakdown_line() {
        let catalog = Catalog::embedded();
        let session = QuoteSession::open(&catalog, &ServiceId("pest-control".to_string()))
            .expect("session opens");

        let message = handoff_message(session.service(), session.breakdown());
        let line_count = message.lines().count();
        // Greeting, base line, subtotal, total.
        assert_eq!(line_count, 4);
    }
}
