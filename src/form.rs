//! The membership application of the TSV Berlin-Wedding 1862 e.V.
//!
//! The first page is the form the new member fills in and hands over; the statute extract and
//! the fee table that follow are meant to be kept by the member.

use log::info;

use crate::assets::LOGO_KEY;
use crate::composer::{
    ChoiceColumn, ComposedForm, FieldColumn, Section, SectionComposer, FIELD_ROW_SPACING,
};
use crate::content::ContentStore;
use crate::drawable::{Logo, Rect};
use crate::error::FormError;
use crate::flow::PriceTable;
use crate::geometry::PageGeometry;
use crate::styles::{NORMAL, SMALL, SUBTITLE, TITLE};

/// Width of the frame around the standing order notice.
const NOTICE_FRAME_WIDTH: f64 = 495.0;
/// Height of the frame around the standing order notice.
const NOTICE_FRAME_HEIGHT: f64 = 65.0;

/// Key of the fee table in the content store.
pub const PRICES_KEY: &str = "prices";

/// Content store keys of the statute extract, in print order with their styles.
pub const STATUTE_KEYS: [(&str, &str); 6] = [
    ("legal_text.section6.title", NORMAL),
    ("legal_text.section6.text", SMALL),
    ("legal_text.section6.text2", SMALL),
    ("legal_text.section7.title", NORMAL),
    ("legal_text.section7.text1", SMALL),
    ("legal_text.section7.text2", SMALL),
];

/// Composes the membership form.
#[derive(Debug)]
pub struct MembershipForm;

impl MembershipForm {
    /// Builds and validates the full flow list from `content`.
    pub fn compose(
        content: &ContentStore,
        geometry: &PageGeometry,
    ) -> Result<ComposedForm, FormError> {
        let mut form = ComposedForm::new();
        form.push(header()?);
        form.push(membership()?);
        form.push(personal()?);
        form.push(payment()?);
        form.push(consent()?);
        form.push(member_copy(content)?);

        let fields = form.validate(geometry)?;
        info!(
            "Composed membership form: {} section(s), {} field(s)",
            form.sections().len(),
            fields.len()
        );
        Ok(form)
    }
}

fn header() -> Result<Section, FormError> {
    let mut section = SectionComposer::new("header");
    section
        .overlay(Logo::new(LOGO_KEY))
        .paragraph(TITLE, "<b><i>Eintrittserklärung</i></b>")?
        .paragraph(
            NORMAL,
            "Hiermit erkläre ich meine Mitgliedschaft beim <b>TSV Berlin-Wedding 1862 e.V.</b>",
        )?
        .spacer(10.0);
    Ok(section.finish())
}

fn membership() -> Result<Section, FormError> {
    let mut section = SectionComposer::new("membership");
    section
        .row_caption("Als:")
        .choice_row(
            "mitgliedschaft",
            &[
                ChoiceColumn::new("aktiv", 55.0)
                    .caption("aktives")
                    .tooltip("aktives Mitglied"),
                ChoiceColumn::new("passiv", 125.0)
                    .caption("passives Mitglied")
                    .tooltip("passives Mitglied"),
            ],
        )?
        .spacer(15.0)
        .row_caption("Abteilung:")
        .choice_row(
            "Abteilung",
            &[
                ChoiceColumn::new("Badminton", 55.0),
                ChoiceColumn::new("Ultimate-Frisbee", 125.0),
                ChoiceColumn::new("Frauengymnastik", 220.0),
                ChoiceColumn::new("Kinderturnen", 320.0),
                ChoiceColumn::new("Volleyball", 405.0),
            ],
        )?
        .spacer(20.0);
    Ok(section.finish())
}

fn personal() -> Result<Section, FormError> {
    let mut section = SectionComposer::new("personal");
    section
        .field_row(
            &[
                FieldColumn::left("Name", "Vorname und Nachname"),
                FieldColumn::right(
                    "Erziehungsberechtigte",
                    "bei Jugendlichen Vor + Nachnamen des/der Erziehungsberechtigten deutlich in Druckschrift!",
                )
                .tooltip("Erziehungsberechtigte"),
            ],
            FIELD_ROW_SPACING,
        )?
        .spacer(FIELD_ROW_SPACING)
        .field_row(
            &[
                FieldColumn::left("Strasse", "Straße, Hausnummer"),
                FieldColumn::right("Ort", "Postleitzahl, Wohnort"),
            ],
            FIELD_ROW_SPACING,
        )?
        .spacer(FIELD_ROW_SPACING)
        .field_row(
            &[
                FieldColumn::left("Geburtsdatum", "Geburtsdatum"),
                FieldColumn::right("Telefon", "Telefon"),
            ],
            FIELD_ROW_SPACING,
        )?
        .spacer(FIELD_ROW_SPACING)
        .field_row(
            &[FieldColumn::left(
                "EMail",
                "E-Mail (z.B. für elektronische Beitragsrechnung bei Bankeinzug)",
            )
            .tooltip("E-Mail")],
            FIELD_ROW_SPACING,
        )?
        .spacer(FIELD_ROW_SPACING)
        .row_caption("Geschlecht:")
        .choice_row(
            "Geschlecht",
            &[
                ChoiceColumn::new("männlich", 60.0),
                ChoiceColumn::new("weiblich", 130.0),
                ChoiceColumn::new("divers", 220.0),
            ],
        )?
        .spacer(FIELD_ROW_SPACING)
        .row_caption("Ich bin:")
        .choice_row(
            "Status",
            &[
                ChoiceColumn::new("berufstätig", 60.0),
                ChoiceColumn::new("z.Zt. erwerbslos", 130.0),
                ChoiceColumn::new("u18", 220.0)
                    .caption("Kind/Schüler bis 18. Lj.")
                    .tooltip("Kind/Schüler bis 18. Lj."),
                ChoiceColumn::new("student_azubi", 340.0)
                    .caption("Student/Azubi bis 27. Lj.")
                    .tooltip("Student/Azubi bis 27. Lj."),
            ],
        )?
        .spacer(FIELD_ROW_SPACING);
    Ok(section.finish())
}

fn payment() -> Result<Section, FormError> {
    let mut section = SectionComposer::new("payment");
    section
        .paragraph(NORMAL, "<b>Beitragszahlung:</b>")?
        .paragraph(
            NORMAL,
            "Der Beitrag wird jährlich bis zum 31. März von meinem Konto abgebucht werden",
        )?
        .spacer(3.0)
        .overlay(Rect::new(NOTICE_FRAME_WIDTH, NOTICE_FRAME_HEIGHT)?)
        .spacer(3.0)
        .paragraph(NORMAL, "<b>Einzugsermächtigung:</b>")?
        .spacer(6.0)
        .field_row(
            &[
                FieldColumn::left("Name der Bank:", "Name der Bank"),
                FieldColumn::right("Kontoinhaber", "Kontoinhaber"),
            ],
            FIELD_ROW_SPACING,
        )?
        .spacer(FIELD_ROW_SPACING)
        .field_row(
            &[
                FieldColumn::left("IBAN", "IBAN"),
                FieldColumn::right(
                    "Datum/Unterschrift des Kontoinhabers",
                    "Datum/Unterschrift des Kontoinhabers",
                ),
            ],
            FIELD_ROW_SPACING,
        )?
        .spacer(17.0);
    Ok(section.finish())
}

fn consent() -> Result<Section, FormError> {
    let mut section = SectionComposer::new("consent");
    section
        .choice_row(
            "Zahlung",
            &[ChoiceColumn::new("Satzung", 0.0)
                .caption("Die Vereinssatzung erkenne ich an.")
                .tooltip("Die Vereinssatzung erkenne ich an.")],
        )?
        .spacer(15.0)
        .field_row(
            &[
                FieldColumn::left("Ort/Datum", "Ort/Datum").span(0.0, 150.0),
                FieldColumn::left(
                    "Unterschrift",
                    "Unterschrift (bei Jugendlichen die Unterschrift des/der Erziehungsberechtigten)",
                )
                .tooltip("Unterschrift")
                .span(160.0, 310.0),
            ],
            15.0,
        )?
        .spacer(5.0);
    Ok(section.finish())
}

fn member_copy(content: &ContentStore) -> Result<Section, FormError> {
    let prices = content.price_sheet(PRICES_KEY)?;
    let table = PriceTable::try_from(&prices)
        .map_err(|err| FormError::content(PRICES_KEY, err))?;
    let cut_line = vec!["-"; 95].join(" ");

    let mut section = SectionComposer::new("member copy");
    section
        .paragraph(NORMAL, &cut_line)?
        .paragraph(NORMAL, "<b>Für die Unterlagen des neuen Mitglieds</b>")?
        .paragraph(
            NORMAL,
            "<b>Auszug aus der Satzung des TSV Berlin Wedding 1862 e.V.</b>",
        )?
        .spacer(3.0);

    for (index, (key, style)) in STATUTE_KEYS.iter().enumerate() {
        if index == 3 {
            section.spacer(3.0);
        }
        section.content_paragraph(content, key, style)?;
    }

    section
        .paragraph(SUBTITLE, &format!("Beiträge (Stand {})", prices.stand_date))?
        .paragraph(SMALL, "<b>Einmalige Aufnahmegebühr: ein Monatsbeitrag</b>")?
        .table(table)
        .paragraph(SMALL, &prices.extra_info.join(" "))?
        .spacer(5.0)
        .paragraph(
            NORMAL,
            "Das Eintrittsformular bitte bei der Abteilungsleitung abgeben oder in Abstimmung \
             senden an TSV Berlin-Wedding 1862 e.V. c/o Hüske, Niederbarnimstraße 6, 10247 Berlin",
        )?;
    Ok(section.finish())
}
