// mistclone - clone WLAN configurations through the Mist cloud API
// Copyright (C) 2024 Mathias Uhl <mathiasuhl@gmx.de>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Interactive clone flow: pick a site, pick a WLAN, say how many copies and
//! what to call them. Every step moves forward; bad input ends the run.

use crate::client::{ApiClient, ApiError};
use crate::render::field_str;
use serde_json::Value;
use std::io::{self, BufRead, Write};
use thiserror::Error;
use tracing::info;

pub const INTERRUPTED_MESSAGE: &str = "Script interrupted by user.";

const TROUBLESHOOTING: [&str; 4] = [
    "Your API token is correct and has proper permissions",
    "Your organization ID is correct",
    "You have network connectivity to Mist API",
    "The site ID and WiFi ID you entered exist in your organization",
];

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Invalid {what} number.")]
    InvalidSelection { what: &'static str },
    #[error("Invalid clone count {0:?}; enter a whole number.")]
    InvalidCount(String),
    #[error("input closed")]
    Interrupted,
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("console I/O failed: {0}")]
    Io(#[from] io::Error),
}

pub struct Driver<'a, R, W> {
    client: &'a ApiClient,
    input: R,
    output: W,
}

impl<'a, R: BufRead, W: Write> Driver<'a, R, W> {
    pub fn new(client: &'a ApiClient, input: R, output: W) -> Self {
        Self {
            client,
            input,
            output,
        }
    }

    /// Runs the whole flow and returns the created WLANs in clone order.
    pub fn run(&mut self) -> Result<Vec<Value>, DriverError> {
        writeln!(self.output, "\nFetching list of available sites...")?;
        let sites = self.client.list_sites()?;
        if sites.is_empty() {
            writeln!(self.output, "No sites found in your organization.")?;
            return Ok(Vec::new());
        }

        writeln!(self.output, "\nAvailable Sites:")?;
        for (i, site) in sites.iter().enumerate() {
            writeln!(self.output, "{}. Name: {}", i + 1, site.name)?;
        }
        let site = &sites[self.select(
            "\nEnter the number of the site you want to work with: ",
            sites.len(),
            "site",
        )?];
        info!(site_id = %site.id, site = %site.name, "site selected");

        writeln!(self.output, "\nFetching list of available WiFis...")?;
        let wlans = self.client.list_wlans(&site.id)?;
        if wlans.is_empty() {
            writeln!(self.output, "No WiFis found in the selected site.")?;
            return Ok(Vec::new());
        }

        writeln!(self.output, "\nAvailable WiFis:")?;
        for (i, wlan) in wlans.iter().enumerate() {
            writeln!(
                self.output,
                "{}. SSID: {}, VLAN ID: {}",
                i + 1,
                wlan.ssid,
                wlan.vlan_label()
            )?;
        }
        let source = &wlans[self.select(
            "\nEnter the number of the WiFi you want to clone: ",
            wlans.len(),
            "WiFi",
        )?];
        let source_id = source.id.clone().unwrap_or_default();
        info!(wlan_id = %source_id, ssid = %source.ssid, "source WiFi selected");

        let count_input = self.prompt(
            "Enter the number of times you want to clone the WiFi (press Enter for 1): ",
        )?;
        let count = parse_count(&count_input)?;

        let mut created = Vec::new();
        for n in 1..=count {
            let name = self.prompt(&format!(
                "Enter the name for clone {n} (or press Enter to use the original name): "
            ))?;
            let name = if name.is_empty() {
                source.ssid.clone()
            } else {
                name
            };

            writeln!(self.output, "\nCloning WiFi {n}...")?;
            let result = self.client.clone_wlan(&site.id, &source_id, &name)?;
            writeln!(self.output, "\nSuccessfully cloned WiFi {n}!")?;
            writeln!(self.output, "New WiFi ID: {}", field_str(&result, "id"))?;
            writeln!(self.output, "New WiFi SSID: {}", field_str(&result, "ssid"))?;
            created.push(result);
        }

        Ok(created)
    }

    fn select(&mut self, text: &str, len: usize, what: &'static str) -> Result<usize, DriverError> {
        let answer = self.prompt(text)?;
        parse_selection(&answer, len).ok_or(DriverError::InvalidSelection { what })
    }

    /// Prints `text`, reads one line and strips the line terminator. End of
    /// input counts as an interruption.
    fn prompt(&mut self, text: &str) -> Result<String, DriverError> {
        write!(self.output, "{text}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(DriverError::Interrupted);
        }
        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(line)
    }
}

/// 1-based menu choice to a 0-based index.
pub fn parse_selection(input: &str, len: usize) -> Option<usize> {
    let choice: usize = input.trim().parse().ok()?;
    (1..=len).contains(&choice).then(|| choice - 1)
}

/// Empty input means one clone; zero or a negative number means none.
pub fn parse_count(input: &str) -> Result<usize, DriverError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(1);
    }
    let count: i64 = trimmed
        .parse()
        .map_err(|_| DriverError::InvalidCount(trimmed.to_string()))?;
    if count <= 0 {
        return Ok(0);
    }
    Ok(usize::try_from(count).unwrap_or(usize::MAX))
}

/// Final message for a run that did not complete.
pub fn report_failure<W: Write>(out: &mut W, err: &DriverError) -> io::Result<()> {
    if let DriverError::Interrupted = err {
        return writeln!(out, "\n{INTERRUPTED_MESSAGE}");
    }

    writeln!(out, "\nError: {err}")?;
    writeln!(out, "\nPlease check:")?;
    for (i, hint) in TROUBLESHOOTING.iter().enumerate() {
        writeln!(out, "{}. {hint}", i + 1)?;
    }
    Ok(())
}
