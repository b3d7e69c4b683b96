// ========================================================================================
//
//                           THE INTERACTIVE TERMINAL FORM
//
// ========================================================================================
//
// One screen, one widget per input, one Predict trigger. The widget state lives in
// `FormState` and nowhere else: every key press mutates it, and the screen is a
// pure rendering of it. Any widget change discards the previous prediction, so a
// result on screen always belongs to the inputs shown next to it.

use breastrisk::chart::{ChartData, format_value};
use breastrisk::inputs::{
    AGE, ALCOHOL_INTAKE, Choice, FIRST_PREGNANCY_AGE, FieldRange, HEIGHT_CM, MENARCHE_AGE,
    PARITY, RiskInputs, WEIGHT_KG,
};
use breastrisk::model::RiskClassifier;
use breastrisk::pipeline::{self, Assessment};
use breastrisk::present::{Advice, RiskLabel};
use breastrisk::report::{APP_SUBTITLE, APP_TITLE};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::prelude::*;
use ratatui::widgets::{
    Bar, BarChart, BarGroup, Block, Borders, List, ListItem, ListState, Paragraph, Wrap,
};
use std::io::{self, IsTerminal, Stdout};

/// Steps taken by PageUp/PageDown on numeric widgets.
const COARSE_STEPS: i32 = 10;

// ========================================================================================
//                                   FORM MODEL
// ========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Age,
    Weight,
    Height,
    MenarcheAge,
    FirstPregnancyAge,
    Parity,
    FamilyHistory,
    OralContraceptives,
    HormoneTherapy,
    UrbanResidence,
    PollutionExposure,
    Breastfeeding,
    Smoking,
    AlcoholIntake,
    PhysicalActivity,
    Education,
    Predict,
}

impl FormField {
    pub const ALL: [FormField; 17] = [
        FormField::Age,
        FormField::Weight,
        FormField::Height,
        FormField::MenarcheAge,
        FormField::FirstPregnancyAge,
        FormField::Parity,
        FormField::FamilyHistory,
        FormField::OralContraceptives,
        FormField::HormoneTherapy,
        FormField::UrbanResidence,
        FormField::PollutionExposure,
        FormField::Breastfeeding,
        FormField::Smoking,
        FormField::AlcoholIntake,
        FormField::PhysicalActivity,
        FormField::Education,
        FormField::Predict,
    ];

    pub fn prompt(self) -> &'static str {
        match self {
            FormField::Age => "Age",
            FormField::Weight => "Weight (kg)",
            FormField::Height => "Height (cm)",
            FormField::MenarcheAge => "Age at First Menstruation",
            FormField::FirstPregnancyAge => "Age at First Pregnancy",
            FormField::Parity => "Number of Births (Parity)",
            FormField::FamilyHistory => "Family History of Breast Cancer",
            FormField::OralContraceptives => "Used Oral Contraceptives?",
            FormField::HormoneTherapy => "Used Hormone Therapy?",
            FormField::UrbanResidence => "Lives in Urban Area?",
            FormField::PollutionExposure => "Exposed to Pollution?",
            FormField::Breastfeeding => "Breastfed Children?",
            FormField::Smoking => "Smoking Status",
            FormField::AlcoholIntake => "Alcohol Intake (units/week)",
            FormField::PhysicalActivity => "Physical Activity Level",
            FormField::Education => "Education Level",
            FormField::Predict => "Predict Risk",
        }
    }
}

/// What the last Predict press produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Assessed(Box<Assessment>),
    Rejected(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormAction {
    Continue,
    Predict,
    Quit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormState {
    pub inputs: RiskInputs,
    pub selected: usize,
    pub outcome: Option<Outcome>,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            inputs: RiskInputs::default(),
            selected: 0,
            outcome: None,
        }
    }
}

impl FormState {
    pub fn field(&self) -> FormField {
        FormField::ALL[self.selected]
    }

    /// Applies one key press to the widget state and reports what the event loop
    /// should do next.
    pub fn handle_key(&mut self, key: KeyEvent) -> FormAction {
        if key.kind != KeyEventKind::Press {
            return FormAction::Continue;
        }
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                FormAction::Quit
            }
            KeyCode::Char('q') | KeyCode::Esc => FormAction::Quit,
            KeyCode::Enter | KeyCode::Char('p') => FormAction::Predict,
            KeyCode::Up | KeyCode::Char('k') | KeyCode::BackTab => {
                self.selected = self.selected.saturating_sub(1);
                FormAction::Continue
            }
            KeyCode::Down | KeyCode::Char('j') | KeyCode::Tab => {
                self.selected = (self.selected + 1).min(FormField::ALL.len() - 1);
                FormAction::Continue
            }
            KeyCode::Left | KeyCode::Char('h') => self.adjust(-1),
            KeyCode::Right | KeyCode::Char('l') => self.adjust(1),
            KeyCode::PageDown => self.adjust(-COARSE_STEPS),
            KeyCode::PageUp => self.adjust(COARSE_STEPS),
            _ => FormAction::Continue,
        }
    }

    /// Moves the selected widget by `steps` increments. Numeric widgets stay
    /// inside their range; choice widgets cycle.
    fn adjust(&mut self, steps: i32) -> FormAction {
        let before = self.inputs;
        let field = self.field();
        let inputs = &mut self.inputs;
        match field {
            FormField::Age => inputs.age = step_whole(inputs.age, AGE, steps),
            FormField::Weight => inputs.weight_kg = step_value(inputs.weight_kg, WEIGHT_KG, steps),
            FormField::Height => inputs.height_cm = step_value(inputs.height_cm, HEIGHT_CM, steps),
            FormField::MenarcheAge => {
                inputs.menarche_age = step_whole(inputs.menarche_age, MENARCHE_AGE, steps)
            }
            FormField::FirstPregnancyAge => {
                inputs.first_pregnancy_age =
                    step_whole(inputs.first_pregnancy_age, FIRST_PREGNANCY_AGE, steps)
            }
            FormField::Parity => inputs.parity = step_whole(inputs.parity, PARITY, steps),
            FormField::FamilyHistory => {
                inputs.family_history = step_choice(inputs.family_history, steps)
            }
            FormField::OralContraceptives => {
                inputs.oral_contraceptive_use = step_choice(inputs.oral_contraceptive_use, steps)
            }
            FormField::HormoneTherapy => {
                inputs.hormone_therapy_use = step_choice(inputs.hormone_therapy_use, steps)
            }
            FormField::UrbanResidence => {
                inputs.urban_residence = step_choice(inputs.urban_residence, steps)
            }
            FormField::PollutionExposure => {
                inputs.exposure_to_pollution = step_choice(inputs.exposure_to_pollution, steps)
            }
            FormField::Breastfeeding => {
                inputs.breastfeeding_history = step_choice(inputs.breastfeeding_history, steps)
            }
            FormField::Smoking => inputs.smoking_status = step_choice(inputs.smoking_status, steps),
            FormField::AlcoholIntake => {
                inputs.alcohol_intake = step_value(inputs.alcohol_intake, ALCOHOL_INTAKE, steps)
            }
            FormField::PhysicalActivity => {
                inputs.physical_activity_level = step_choice(inputs.physical_activity_level, steps)
            }
            FormField::Education => {
                inputs.education_level = step_choice(inputs.education_level, steps)
            }
            FormField::Predict => {}
        }
        self.inputs = self.inputs.clamped();
        if self.inputs != before {
            self.outcome = None;
        }
        FormAction::Continue
    }

    /// Runs the full pipeline on the current widget state.
    pub fn predict(&mut self, model: &dyn RiskClassifier) {
        self.outcome = Some(match pipeline::assess(model, &self.inputs) {
            Ok(assessment) => Outcome::Assessed(Box::new(assessment)),
            Err(e) => {
                log::warn!("Prediction rejected: {e}");
                Outcome::Rejected(e.to_string())
            }
        });
    }

    pub fn value_text(&self, field: FormField) -> String {
        let inputs = &self.inputs;
        match field {
            FormField::Age => inputs.age.to_string(),
            FormField::Weight => format!("{:.1}", inputs.weight_kg),
            FormField::Height => format!("{:.1}", inputs.height_cm),
            FormField::MenarcheAge => inputs.menarche_age.to_string(),
            FormField::FirstPregnancyAge => inputs.first_pregnancy_age.to_string(),
            FormField::Parity => inputs.parity.to_string(),
            FormField::FamilyHistory => inputs.family_history.to_string(),
            FormField::OralContraceptives => inputs.oral_contraceptive_use.to_string(),
            FormField::HormoneTherapy => inputs.hormone_therapy_use.to_string(),
            FormField::UrbanResidence => inputs.urban_residence.to_string(),
            FormField::PollutionExposure => inputs.exposure_to_pollution.to_string(),
            FormField::Breastfeeding => inputs.breastfeeding_history.to_string(),
            FormField::Smoking => inputs.smoking_status.to_string(),
            FormField::AlcoholIntake => format!("{:.1}", inputs.alcohol_intake),
            FormField::PhysicalActivity => inputs.physical_activity_level.to_string(),
            FormField::Education => inputs.education_level.to_string(),
            FormField::Predict => String::new(),
        }
    }
}

fn step_value(value: f64, range: FieldRange, steps: i32) -> f64 {
    let moved = range.clamp(value + f64::from(steps) * range.step);
    // All widget steps are multiples of 0.1; snap back onto that grid.
    (moved * 10.0).round() / 10.0
}

fn step_whole(value: u32, range: FieldRange, steps: i32) -> u32 {
    step_value(f64::from(value), range, steps) as u32
}

fn step_choice<C: Choice>(choice: C, steps: i32) -> C {
    match steps.signum() {
        1 => choice.next(),
        -1 => choice.prev(),
        _ => choice,
    }
}

// ========================================================================================
//                                 TERMINAL SESSION
// ========================================================================================

/// Owns the terminal while the form is on screen and restores it on drop.
struct TerminalSession {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalSession {
    fn start() -> io::Result<Self> {
        if !io::stdout().is_terminal() {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                "stdout is not a terminal; use `breastrisk predict` instead",
            ));
        }

        enable_raw_mode()?;
        let mut stdout = io::stdout();
        if let Err(e) = execute!(stdout, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(e);
        }
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Runs the form until the user quits.
pub fn run(model: &dyn RiskClassifier, logo: Option<&str>) -> io::Result<()> {
    let mut session = TerminalSession::start()?;
    let mut state = FormState::default();

    loop {
        session.terminal.draw(|frame| draw(frame, &state, logo))?;

        if let Event::Key(key) = event::read()? {
            match state.handle_key(key) {
                FormAction::Continue => {}
                FormAction::Predict => state.predict(model),
                FormAction::Quit => break,
            }
        }
    }
    Ok(())
}

// ========================================================================================
//                                     RENDERING
// ========================================================================================

fn draw(frame: &mut Frame, state: &FormState, logo: Option<&str>) {
    let logo_lines = logo.map_or(0, |l| l.lines().count() as u16);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(logo_lines + 2),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    let mut header: Vec<Line> = logo
        .map(|l| l.lines().map(Line::from).collect())
        .unwrap_or_default();
    header.push(Line::from(APP_TITLE).bold().centered());
    header.push(Line::from(APP_SUBTITLE).centered());
    frame.render_widget(Paragraph::new(header), rows[0]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(50), Constraint::Min(0)])
        .split(rows[1]);
    draw_form(frame, state, columns[0]);
    draw_result(frame, state, columns[1]);

    let help = "↑/↓ select  ←/→ adjust  PgUp/PgDn ×10  Enter predict  q quit";
    frame.render_widget(
        Paragraph::new(help).style(Style::default().fg(Color::DarkGray)),
        rows[2],
    );
}

fn draw_form(frame: &mut Frame, state: &FormState, area: Rect) {
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)])
        .split(area);

    let items: Vec<ListItem> = FormField::ALL
        .iter()
        .map(|&field| match field {
            FormField::Predict => ListItem::new(Line::from("[ Predict Risk ]").bold()),
            _ => ListItem::new(format!(
                "{:<32}{:>14}",
                field.prompt(),
                state.value_text(field)
            )),
        })
        .collect();
    let list = List::new(items)
        .block(Block::default().title("Your Details").borders(Borders::ALL))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut list_state = ListState::default().with_selected(Some(state.selected));
    frame.render_stateful_widget(list, parts[0], &mut list_state);

    let bmi = Paragraph::new(format!("Calculated BMI: {:.1}", state.inputs.bmi()))
        .block(Block::default().title("BMI Calculator").borders(Borders::ALL));
    frame.render_widget(bmi, parts[1]);
}

fn draw_result(frame: &mut Frame, state: &FormState, area: Rect) {
    let block = Block::default().title("Result").borders(Borders::ALL);
    match &state.outcome {
        None => {
            let hint = Paragraph::new("Adjust your details, then press Enter to predict.")
                .block(block)
                .style(Style::default().fg(Color::DarkGray));
            frame.render_widget(hint, area);
        }
        Some(Outcome::Rejected(message)) => {
            let error = Paragraph::new(message.as_str())
                .block(block)
                .style(Style::default().fg(Color::Red))
                .wrap(Wrap { trim: false });
            frame.render_widget(error, area);
        }
        Some(Outcome::Assessed(assessment)) => draw_assessment(frame, assessment, area),
    }
}

fn draw_assessment(frame: &mut Frame, assessment: &Assessment, area: Rect) {
    let presentation = &assessment.presentation;
    let headline_color = match presentation.label {
        RiskLabel::High => Color::Red,
        RiskLabel::Low => Color::Green,
    };
    let headline = Paragraph::new(Line::from(presentation.headline()).bold())
        .block(Block::default().borders(Borders::ALL))
        .style(Style::default().fg(headline_color));

    match (&presentation.contributions, &presentation.profile) {
        (Some(contributions), Some(profile)) => {
            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(3),
                    Constraint::Min(17),
                    Constraint::Length(advice_height(presentation.advice)),
                ])
                .split(area);
            frame.render_widget(headline, rows[0]);

            let charts = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                .split(rows[1]);
            frame.render_widget(bar_chart(contributions), charts[0]);
            frame.render_widget(bar_chart(profile), charts[1]);

            frame.render_widget(advice_paragraph(presentation.advice, None), rows[2]);
        }
        _ => {
            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(3), Constraint::Min(0)])
                .split(area);
            frame.render_widget(headline, rows[0]);
            frame.render_widget(
                advice_paragraph(presentation.advice, presentation.about_dataset),
                rows[1],
            );
        }
    }
}

fn advice_height(advice: &Advice) -> u16 {
    advice.points.len() as u16 + 2
}

fn advice_paragraph(advice: &'static Advice, about: Option<&'static str>) -> Paragraph<'static> {
    let mut lines: Vec<Line> = advice
        .points
        .iter()
        .map(|point| Line::from(format!("- {point}")))
        .collect();
    if let Some(about) = about {
        lines.push(Line::from(""));
        lines.extend(about.lines().map(Line::from));
    }
    Paragraph::new(lines)
        .block(Block::default().title(advice.heading).borders(Borders::ALL))
        .wrap(Wrap { trim: false })
}

/// Draws a chart as horizontal bars. ratatui bars hold integers, so values are
/// scaled by ten and the printed value keeps the real number.
fn bar_chart(chart: &ChartData) -> BarChart<'static> {
    let bars: Vec<Bar<'static>> = chart
        .bars
        .iter()
        .map(|bar| {
            let (r, g, b) = bar.tone.rgb();
            Bar::default()
                .label(Line::from(bar.label))
                .value((bar.value * 10.0).round() as u64)
                .text_value(format_value(bar.value))
                .style(Style::default().fg(Color::Rgb(r, g, b)))
        })
        .collect();

    BarChart::default()
        .block(
            Block::default()
                .title(chart.title)
                .title_bottom(chart.axis_label)
                .borders(Borders::ALL),
        )
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0)
        .max((chart.max_value() * 10.0).round().max(1.0) as u64)
        .data(BarGroup::default().bars(&bars))
}
