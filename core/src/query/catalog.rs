//! The fixed catalog of questions and reports

use serde::Serialize;

/// How a result set is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChartKind {
    /// Bar chart
    Bar,
    /// Line chart over an ordered x axis
    Line,
}

/// Chart drawn from two result columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChartSpec {
    /// Chart kind
    pub kind: ChartKind,
    /// Column on the x axis
    pub x: &'static str,
    /// Column on the y axis
    pub y: &'static str,
}

/// One canned statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    /// Position in the catalog, starting at 1
    pub number: u32,
    /// Human-readable question
    pub label: &'static str,
    /// Read-only statement
    pub sql: &'static str,
    /// Name of the single positional parameter, if the statement takes one
    pub parameter: Option<&'static str>,
    /// Chart, for entries drawn as one
    pub chart: Option<ChartSpec>,
}

const fn question(number: u32, label: &'static str, sql: &'static str) -> CatalogEntry {
    CatalogEntry {
        number,
        label,
        sql,
        parameter: None,
        chart: None,
    }
}

pub(crate) static QUESTIONS: [CatalogEntry; 25] = [
    question(
        1,
        "How many food providers and receivers are there in each city?",
        "SELECT p.City, COUNT(DISTINCT p.Provider_ID) AS Providers, COUNT(DISTINCT r.Receiver_ID) AS Receivers \
         FROM providers p \
         LEFT JOIN receivers r ON p.City = r.City \
         GROUP BY p.City",
    ),
    question(
        2,
        "Which type of food provider contributes the most food?",
        "SELECT Provider_Type, COUNT(*) AS Total_Food_Items \
         FROM food_listings \
         GROUP BY Provider_Type \
         ORDER BY Total_Food_Items DESC \
         LIMIT 1",
    ),
    CatalogEntry {
        number: 3,
        label: "What is the contact information of food providers in a specific city?",
        sql: "SELECT Name, Type, Address, Contact \
              FROM providers \
              WHERE City = ?",
        parameter: Some("City"),
        chart: None,
    },
    question(
        4,
        "Which receivers have claimed the most food?",
        "SELECT r.Name, COUNT(c.Claim_ID) AS Claims \
         FROM claims c \
         JOIN receivers r ON c.Receiver_ID = r.Receiver_ID \
         GROUP BY r.Name \
         ORDER BY Claims DESC \
         LIMIT 5",
    ),
    question(
        5,
        "What is the total quantity of food available from all providers?",
        "SELECT SUM(Quantity) AS Total_Quantity FROM food_listings",
    ),
    question(
        6,
        "Which city has the highest number of food listings?",
        "SELECT City, COUNT(*) AS Listings \
         FROM food_listings f \
         JOIN providers p ON f.Provider_ID = p.Provider_ID \
         GROUP BY City \
         ORDER BY Listings DESC \
         LIMIT 1",
    ),
    question(
        7,
        "What are the most commonly available food types?",
        "SELECT Food_Type, COUNT(*) AS Count \
         FROM food_listings \
         GROUP BY Food_Type \
         ORDER BY Count DESC \
         LIMIT 5",
    ),
    question(
        8,
        "How many food claims have been made for each food item?",
        "SELECT f.Food_Name, COUNT(c.Claim_ID) AS Total_Claims \
         FROM claims c \
         JOIN food_listings f ON c.Food_ID = f.Food_ID \
         GROUP BY f.Food_Name \
         ORDER BY Total_Claims DESC",
    ),
    question(
        9,
        "Which provider has had the highest number of successful food claims?",
        "SELECT p.Name, COUNT(*) AS Successful_Claims \
         FROM claims c \
         JOIN food_listings f ON c.Food_ID = f.Food_ID \
         JOIN providers p ON f.Provider_ID = p.Provider_ID \
         WHERE c.Status = 'Completed' \
         GROUP BY p.Name \
         ORDER BY Successful_Claims DESC \
         LIMIT 1",
    ),
    question(
        10,
        "What percentage of food claims are completed vs. pending vs. canceled?",
        "SELECT Status, ROUND(COUNT(*) * 100.0 / (SELECT COUNT(*) FROM claims), 2) AS Percentage \
         FROM claims \
         GROUP BY Status",
    ),
    question(
        11,
        "What is the average quantity of food claimed per receiver?",
        "SELECT r.Name, ROUND(AVG(f.Quantity), 2) AS Avg_Quantity \
         FROM claims c \
         JOIN food_listings f ON c.Food_ID = f.Food_ID \
         JOIN receivers r ON c.Receiver_ID = r.Receiver_ID \
         GROUP BY r.Name \
         ORDER BY Avg_Quantity DESC \
         LIMIT 10",
    ),
    question(
        12,
        "Which meal type is claimed the most?",
        "SELECT Meal_Type, COUNT(*) AS Claim_Count \
         FROM food_listings f \
         JOIN claims c ON f.Food_ID = c.Food_ID \
         GROUP BY Meal_Type \
         ORDER BY Claim_Count DESC \
         LIMIT 1",
    ),
    question(
        13,
        "What is the total quantity of food donated by each provider?",
        "SELECT p.Name, SUM(f.Quantity) AS Total_Donated \
         FROM food_listings f \
         JOIN providers p ON f.Provider_ID = p.Provider_ID \
         GROUP BY p.Name \
         ORDER BY Total_Donated DESC \
         LIMIT 10",
    ),
    question(
        14,
        "What is the average time between food listing and claim?",
        "SELECT AVG(JULIANDAY(c.Timestamp) - JULIANDAY(f.Expiry_Date)) AS Avg_Days_Before_Expiry \
         FROM claims c \
         JOIN food_listings f ON c.Food_ID = f.Food_ID",
    ),
    question(
        15,
        "How many expired food items are still unclaimed?",
        "SELECT COUNT(*) AS Expired_Unclaimed \
         FROM food_listings f \
         LEFT JOIN claims c ON f.Food_ID = c.Food_ID \
         WHERE f.Expiry_Date < DATE('now') AND c.Claim_ID IS NULL",
    ),
    question(
        16,
        "What is the average quantity of food provided by each type of provider?",
        "SELECT Provider_Type, ROUND(AVG(Quantity), 2) AS Avg_Quantity \
         FROM food_listings \
         GROUP BY Provider_Type",
    ),
    question(
        17,
        "Which city has the highest amount of unclaimed food?",
        "SELECT p.City, SUM(f.Quantity) AS Unclaimed_Quantity \
         FROM food_listings f \
         JOIN providers p ON f.Provider_ID = p.Provider_ID \
         LEFT JOIN claims c ON f.Food_ID = c.Food_ID \
         WHERE c.Claim_ID IS NULL \
         GROUP BY p.City \
         ORDER BY Unclaimed_Quantity DESC \
         LIMIT 1",
    ),
    question(
        18,
        "List providers who haven't had any claims",
        "SELECT DISTINCT p.Name, p.City \
         FROM providers p \
         LEFT JOIN food_listings f ON p.Provider_ID = f.Provider_ID \
         LEFT JOIN claims c ON f.Food_ID = c.Food_ID \
         WHERE c.Claim_ID IS NULL",
    ),
    question(
        19,
        "Which food types are expiring soon (next 3 days)?",
        "SELECT Food_Name, Expiry_Date, Quantity \
         FROM food_listings \
         WHERE DATE(Expiry_Date) <= DATE('now', '+3 days') \
         ORDER BY Expiry_Date",
    ),
    question(
        20,
        "Monthly trend of food donations",
        "SELECT strftime('%Y-%m', Expiry_Date) AS Month, SUM(Quantity) AS Total_Donated \
         FROM food_listings \
         GROUP BY Month \
         ORDER BY Month DESC",
    ),
    question(
        21,
        "Top 5 most donated food items",
        "SELECT Food_Name, SUM(Quantity) AS Total_Quantity \
         FROM food_listings \
         GROUP BY Food_Name \
         ORDER BY Total_Quantity DESC \
         LIMIT 5",
    ),
    question(
        22,
        "Number of unique receivers per city",
        "SELECT City, COUNT(DISTINCT Receiver_ID) AS Unique_Receivers \
         FROM receivers \
         GROUP BY City",
    ),
    // Stored status is spelled "Cancelled"
    question(
        23,
        "What is the total number of canceled claims per receiver?",
        "SELECT r.Name, COUNT(*) AS Canceled_Claims \
         FROM claims c \
         JOIN receivers r ON c.Receiver_ID = r.Receiver_ID \
         WHERE c.Status = 'Cancelled' \
         GROUP BY r.Name \
         ORDER BY Canceled_Claims DESC \
         LIMIT 5",
    ),
    question(
        24,
        "Average food quantity listed per provider per month",
        "SELECT p.Name, strftime('%Y-%m', f.Expiry_Date) AS Month, ROUND(AVG(f.Quantity), 2) AS Avg_Quantity \
         FROM food_listings f \
         JOIN providers p ON f.Provider_ID = p.Provider_ID \
         GROUP BY p.Name, Month \
         ORDER BY Month DESC",
    ),
    question(
        25,
        "Which day of the week has the most food donations?",
        "SELECT strftime('%w', Expiry_Date) AS Weekday, COUNT(*) AS Listings \
         FROM food_listings \
         GROUP BY Weekday \
         ORDER BY Listings DESC",
    ),
];

pub(crate) static REPORTS: [CatalogEntry; 4] = [
    question(
        1,
        "Food wastage trends by category and location",
        "SELECT Food_Type, Location, COUNT(*) as Total_Wasted \
         FROM food_listings \
         GROUP BY Food_Type, Location",
    ),
    CatalogEntry {
        number: 2,
        label: "Top food providers by contributions",
        sql: "SELECT p.Name AS Provider_Name, COUNT(f.Food_ID) AS Contributions \
              FROM food_listings f \
              JOIN providers p ON f.Provider_ID = p.Provider_ID \
              GROUP BY p.Name \
              ORDER BY Contributions DESC \
              LIMIT 10",
        parameter: None,
        chart: Some(ChartSpec {
            kind: ChartKind::Bar,
            x: "Provider_Name",
            y: "Contributions",
        }),
    },
    CatalogEntry {
        number: 3,
        label: "High-demand locations by food claims",
        sql: "SELECT f.Location, COUNT(c.Claim_ID) AS Claim_Count \
              FROM claims c \
              JOIN food_listings f ON c.Food_ID = f.Food_ID \
              GROUP BY f.Location \
              ORDER BY Claim_Count DESC \
              LIMIT 10",
        parameter: None,
        chart: Some(ChartSpec {
            kind: ChartKind::Bar,
            x: "Location",
            y: "Claim_Count",
        }),
    },
    CatalogEntry {
        number: 4,
        label: "Wastage trend over time",
        sql: "SELECT DATE(Expiry_Date) AS Date, COUNT(*) AS Wasted_Food_Count \
              FROM food_listings \
              GROUP BY Date \
              ORDER BY Date",
        parameter: None,
        chart: Some(ChartSpec {
            kind: ChartKind::Line,
            x: "Date",
            y: "Wasted_Food_Count",
        }),
    },
];
