//! The capabilities document served as an MCP resource.

pub const CAPABILITIES_URI: &str = "resin://docs/capabilities";
pub const CAPABILITIES_NAME: &str = "capabilities";
pub const CAPABILITIES_TITLE: &str = "Resin Server Capabilities";
pub const CAPABILITIES_MIME: &str = "text/markdown";

pub const CAPABILITIES_DOC: &str = r#"# Resin MCP Server - Capabilities Overview

## What is Resin?

Resin is an MCP (Model Context Protocol) server for Salesforce fundraising
analytics. It gives AI assistants tools to query donor data, segment
audiences, and run fundraising analytics through natural language. It speaks
MCP over stdio; Salesforce access uses the OAuth refresh-token flow
configured through `SF_CLIENT_ID`, `SF_CLIENT_SECRET` and `SF_REFRESH_TOKEN`.

## Available Tools

### 1. run_soql
**Execute SOQL queries against Salesforce**

- Execute any SOQL query against your Salesforce org
- Returns formatted results with record count
- Supports COUNT() aggregations, GROUP BY clauses, subqueries and
  relationship fields (e.g. `Account.Name`)
- `SELECT COUNT() ...` queries report `Count: N`

**Input:**
- `query` (string, required): The SOQL query to execute
- `limit` (number, optional): Max records to display (1-100, default: 25)

**Output:** Records returned, the query, and the records as JSON

---

### 2. create_record
**Create any Salesforce sObject record**

- Create Contacts, Opportunities, Tasks, custom objects, etc.
- Returns the newly created record ID

**Input:**
- `sobject` (string, required): sObject type (e.g. "Contact", "Opportunity", "Task")
- `fields` (object, required, non-empty): Field names and values

**Output:** sObject, new record ID and the submitted fields

---

### 3. update_record
**Update any Salesforce sObject record**

- Partial updates: only the given fields change

**Input:**
- `sobject` (string, required): sObject type
- `record_id` (string, required): 15 or 18 character Salesforce ID
- `fields` (object, required, non-empty): Field names and new values

**Output:** Success confirmation

---

### 4. query_donors
**Query donors using natural language criteria**

The criteria text is matched against these segments in order; the first
match wins:

1. **Lapsed donors**: "lapsed" (default window 12 months, e.g. "last 18 months")
2. **Major donors**: "major", "over", or a `$` amount (default $1,000, e.g. "over $10k")
3. **Recent donors**: "recent" together with "month" (default 6 months)
4. **First-time donors**: "first"
5. **Recurring donors**: "recurring" or "sustain"
6. **At-risk donors**: "at risk" or "at-risk"
7. **Upgrade candidates**: "upgrade" or "candidate" (default $1,000 lifetime)
8. **Mid-level donors**: "mid level" or "mid-level" ($500 to $5,000)

Anything else falls back to recent donors from the last 6 months.

**Input:**
- `criteria` (string, required): Natural language donor segment description
- `limit` (number, optional): Max donors to return (1-100, default: 25)

**Output:** Donor list (name, email, lifetime giving, last gift), insights and next steps

---

## Data Model

Resin targets the **Salesforce NPSP (Nonprofit Success Pack)** data model:

- **Contact**: Individual donors and constituents
- **Account**: Organizational donors and households
- **Opportunity**: Individual donations/gifts
- **OpportunityContactRole**: Links gifts to donors
- **npe03__Recurring_Donation__c**: Recurring gift schedules
- **Campaign** / **CampaignMember**: Fundraising campaigns and participation

## Pre-Built Query Patterns

**Donor Segmentation (10 patterns):**
lapsed donors, major donors, recent donors, first-time donors, recurring
donors, upgrade candidates, at-risk donors, mid-level donors, high-value
engaged donors, warm prospects

**Opportunity Analytics (11 patterns):**
opportunities by stage, open pipeline, recently won, monthly revenue,
quarterly performance, year-over-year comparison, large gifts, gift
distribution, conversion metrics, average days to close, recently lost

## Performance

- **60-second query caching**: identical SOQL reads are served from cache for
  60 seconds; creates and updates never touch the cache
- **Lazy OAuth**: the first Salesforce call exchanges the refresh token and
  the access token is reused until Salesforce rejects it

## Errors

Tool failures come back as text, not protocol errors:
- **Validation Error**: required input missing, nothing was sent to Salesforce
- **Salesforce Error** / **SOQL Error**: Salesforce rejected the call; the
  block includes the query and the message

## Common Workflows

### Donor Outreach Campaign
1. Use `query_donors` to segment lapsed donors
2. Use `create_record` to create Campaign records
3. Use `update_record` to track outreach status

### Major Gift Pipeline
1. Use `query_donors` to find high-value prospects
2. Use `run_soql` to analyze giving patterns
3. Use `create_record` to create Opportunities
"#;
